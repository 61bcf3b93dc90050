// SPDX-License-Identifier: GPL-3.0-or-later

//! The entry of a JSON compilation database.
//!
//! The format is defined in the LLVM project
//! [documentation](https://clang.llvm.org/docs/JSONCompilationDatabase.html).

use crate::compilation::CompileCommand;
use crate::invocation::response;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Represents an entry of the compilation database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The working directory of the compilation.
    pub directory: String,
    /// The compile command as a single string.
    ///
    /// Entries written by other tools may use `arguments` instead, those
    /// are kept in the unknown fields.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    /// The main translation unit source processed by this compilation step.
    pub file: String,
    /// Fields of existing entries which are not known here. These are
    /// written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entry {
    pub fn new(directory: impl Into<String>, command: impl Into<String>, file: impl Into<String>) -> Self {
        Entry {
            directory: directory.into(),
            command: command.into(),
            file: file.into(),
            extra: Map::new(),
        }
    }

    /// Semantic validation of the entry.
    pub fn validate(self) -> Result<Self, EntryError> {
        if self.file.is_empty() {
            return Err(EntryError::EmptyFileName);
        }
        if self.directory.is_empty() {
            return Err(EntryError::EmptyDirectory);
        }
        if self.command.is_empty() && !self.extra.contains_key("arguments") {
            return Err(EntryError::CommandOrArgumentsAreMissing);
        }
        Ok(self)
    }
}

/// The arguments are quoted with the same rules the command line is split by.
impl From<CompileCommand> for Entry {
    fn from(value: CompileCommand) -> Self {
        Entry::new(value.directory, response::join(&value.arguments), value.file)
    }
}

/// An element of the database.
///
/// Elements of an existing database which are not valid entries are kept
/// as they were read, and written back unchanged.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Element {
    Entry(Entry),
    Unrecognized(Value),
}

impl From<Entry> for Element {
    fn from(entry: Entry) -> Self {
        Element::Entry(entry)
    }
}

/// Represents the possible errors of an entry validation.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("Entry has an empty file field")]
    EmptyFileName,
    #[error("Entry has an empty directory field")]
    EmptyDirectory,
    #[error("Both command and arguments fields are empty")]
    CommandOrArgumentsAreMissing,
}
