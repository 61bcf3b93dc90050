// SPDX-License-Identifier: GPL-3.0-or-later

//! This module is responsible for writing the compilation database.
//!
//! The `OutputWriter` struct represents the main entry point for writing output.
//! The input to the `OutputWriter` is a stream of `CompileCommand` instances,
//! which are appended to the entries of the existing database.
//!
//! # Concurrency
//!
//! A parallel build runs many compiler invocations at once, and all of them
//! update the same database. The new content is written into a uniquely named
//! temporary file next to the database, which then replaces the database by
//! rename. Readers never see a partially written file, and concurrent writers
//! never interleave. But the read-modify-write cycle is not locked: when two
//! invocations read the same content, the last rename wins and the entries of
//! the other invocation are lost.

pub mod clang;
mod formats;
mod writers;

use crate::compilation::CompileCommand;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use writers::{
    AppendClangOutputWriter, AtomicClangOutputWriter, ClangOutputWriter, ConverterClangOutputWriter, IteratorWriter,
};

// Re-export types for convenience.
pub use formats::{JsonCompilationDatabase, SerializationError, SerializationFormat};

/// A stack of output writers for Clang compilation databases.
type ClangWriterStack = ConverterClangOutputWriter<AppendClangOutputWriter<AtomicClangOutputWriter<ClangOutputWriter>>>;

/// Represents the output writer for JSON compilation databases.
pub struct OutputWriter {
    writer: ClangWriterStack,
}

impl OutputWriter {
    /// Prepares the writing of the database at the given path.
    ///
    /// The temporary file is created here, so a directory which is not
    /// writable is reported before anything else happens.
    pub fn create(path: &Path) -> Result<Self, WriterError> {
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let (file, temp_path) = NamedTempFile::new_in(directory)
            .map_err(|err| WriterError::DatabaseUnwritable {
                path: path.to_path_buf(),
                source: SerializationError::Io(err),
            })?
            .into_parts();
        log::debug!("Temporary output file: {}", temp_path.display());

        let base_writer = ClangOutputWriter::new(file, path);
        let atomic_writer = AtomicClangOutputWriter::new(base_writer, temp_path, path);
        let append_writer = AppendClangOutputWriter::new(atomic_writer, path);
        let converter_writer = ConverterClangOutputWriter::new(append_writer);

        Ok(Self { writer: converter_writer })
    }

    /// Writes the existing entries and the given commands into the database.
    pub fn write(self, commands: impl Iterator<Item = CompileCommand>) -> Result<(), WriterError> {
        self.writer.write(commands)
    }
}

/// Represents errors that can occur while writing output.
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Cannot write compilation database '{path}': {source}")]
    DatabaseUnwritable {
        path: PathBuf,
        #[source]
        source: SerializationError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn command(directory: &str, file: &str) -> CompileCommand {
        CompileCommand {
            directory: directory.to_string(),
            file: file.to_string(),
            arguments: vec!["-c".to_string(), file.to_string()],
        }
    }

    #[test]
    fn test_write_new_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compile_commands.json");

        let sut = OutputWriter::create(&path).unwrap();
        sut.write(vec![command("/work", "/work/a.c")].into_iter()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(
            entries,
            vec![serde_json::json!({ "directory": "/work", "command": "-c /work/a.c", "file": "/work/a.c" })]
        );
    }

    #[test]
    fn test_write_appends_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compile_commands.json");
        OutputWriter::create(&path)
            .unwrap()
            .write(vec![command("/work", "/work/prior.c")].into_iter())
            .unwrap();

        OutputWriter::create(&path)
            .unwrap()
            .write(vec![command("/work", "/work/a.c"), command("/work", "/work/b.c")].into_iter())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let entries: Vec<clang::Entry> = serde_json::from_str(&content).unwrap();
        let files: Vec<&str> = entries.iter().map(|entry| entry.file.as_str()).collect();
        assert_eq!(files, vec!["/work/prior.c", "/work/a.c", "/work/b.c"]);
    }

    #[test]
    fn test_write_without_input_keeps_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compile_commands.json");
        OutputWriter::create(&path)
            .unwrap()
            .write(vec![command("/work", "/work/prior.c")].into_iter())
            .unwrap();
        let before = fs::read_to_string(&path).unwrap();

        OutputWriter::create(&path).unwrap().write(std::iter::empty()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_write_keeps_unrecognized_prior_elements() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compile_commands.json");
        let prior = serde_json::json!([
            { "directory": "/work", "file": "/work/prior.c", "arguments": ["cc", "-c", "/work/prior.c"] },
            { "file": "/work/no-directory.c", "command": "cc -c no-directory.c" }
        ]);
        fs::write(&path, prior.to_string()).unwrap();

        OutputWriter::create(&path).unwrap().write(vec![command("/work", "/work/a.c")].into_iter()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], prior[0]);
        assert_eq!(entries[1], prior[1]);
        assert_eq!(entries[2]["file"], "/work/a.c");
    }

    #[test]
    fn test_create_in_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("compile_commands.json");

        let result = OutputWriter::create(&path);

        match result {
            Err(error @ WriterError::DatabaseUnwritable { .. }) => {
                assert!(error.to_string().contains("compile_commands.json"));
            }
            Ok(_) => panic!("Expected DatabaseUnwritable"),
        }
    }
}
