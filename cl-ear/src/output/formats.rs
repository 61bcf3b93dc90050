// SPDX-License-Identifier: GPL-3.0-or-later

//! This module declares the file format of the compilation database.

use super::clang::{Element, Entry, EntryError};
use serde::ser::{SerializeSeq, Serializer};
use std::io;
use thiserror::Error;

/// Represents errors that can occur while working with file formats.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Generic IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Format syntax error: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("Format semantic error: {0}")]
    Semantic(#[from] EntryError),
}

/// A trait representing a file format that can be written to and read from.
pub trait SerializationFormat<T> {
    /// Writes an iterator of items to the specified writer.
    fn write(writer: impl io::Write, items: impl Iterator<Item = T>) -> Result<(), SerializationError>;

    /// Reads items from the specified reader, returning an iterator of results.
    fn read(reader: impl io::Read) -> impl Iterator<Item = Result<T, SerializationError>>;

    /// Reads entries from the file and ignores any errors.
    fn read_and_ignore(reader: impl io::Read, message_writer: impl Fn(&str)) -> impl Iterator<Item = T> {
        Self::read(reader).filter_map(move |result| match result {
            Ok(value) => Some(value),
            Err(error) => {
                message_writer(&error.to_string());
                None
            }
        })
    }
}

/// The type represents a JSON compilation database format.
///
/// The format is a pretty-printed JSON array of objects, one object for
/// each compilation.
pub struct JsonCompilationDatabase;

impl SerializationFormat<Element> for JsonCompilationDatabase {
    fn write(writer: impl io::Write, elements: impl Iterator<Item = Element>) -> Result<(), SerializationError> {
        let mut ser = serde_json::Serializer::pretty(writer);
        let mut seq = ser.serialize_seq(None)?;
        for element in elements {
            match element {
                // Ensure only valid entries are serialized.
                Element::Entry(entry) => seq.serialize_element(&entry.validate()?)?,
                Element::Unrecognized(value) => seq.serialize_element(&value)?,
            }
        }
        seq.end()?;

        let mut writer = ser.into_inner();
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Reads the document as a whole, and validates the elements one by one.
    ///
    /// A document which is not an array gives a single error. An element
    /// which is not a valid entry is returned as unrecognized.
    fn read(reader: impl io::Read) -> impl Iterator<Item = Result<Element, SerializationError>> {
        let results: Vec<Result<Element, SerializationError>> =
            match serde_json::from_reader::<_, Vec<serde_json::Value>>(reader) {
                Ok(values) => values.into_iter().map(|value| Ok(recognize(value))).collect(),
                Err(error) => vec![Err(SerializationError::Syntax(error))],
            };
        results.into_iter()
    }
}

fn recognize(value: serde_json::Value) -> Element {
    let entry = serde_json::from_value::<Entry>(value.clone())
        .map_err(SerializationError::from)
        .and_then(|entry| Ok(entry.validate()?));
    match entry {
        Ok(entry) => Element::Entry(entry),
        Err(error) => {
            log::debug!("Element is not a valid entry: {error}");
            Element::Unrecognized(value)
        }
    }
}
