// SPDX-License-Identifier: GPL-3.0-or-later

use super::WriterError;
use super::clang::{Element, Entry};
use super::formats::{JsonCompilationDatabase, SerializationError, SerializationFormat};
use crate::compilation::CompileCommand;
use std::{fs, io, path};
use tempfile::TempPath;

/// A writer which consumes the items of an iterator.
///
/// The writers are chained, each one transforms the items and passes them
/// to the next one.
pub(super) trait IteratorWriter<T> {
    fn write(self, items: impl Iterator<Item = T>) -> Result<(), WriterError>;
}

/// Converts the compile commands into database entries.
pub(super) struct ConverterClangOutputWriter<T: IteratorWriter<Element>> {
    writer: T,
}

impl<T: IteratorWriter<Element>> ConverterClangOutputWriter<T> {
    pub(super) fn new(writer: T) -> Self {
        Self { writer }
    }
}

impl<T: IteratorWriter<Element>> IteratorWriter<CompileCommand> for ConverterClangOutputWriter<T> {
    fn write(self, commands: impl Iterator<Item = CompileCommand>) -> Result<(), WriterError> {
        self.writer.write(commands.map(Entry::from).map(Element::from))
    }
}

/// Puts the elements of the existing database in front of the new ones.
pub(super) struct AppendClangOutputWriter<T: IteratorWriter<Element>> {
    writer: T,
    path: Option<path::PathBuf>,
}

impl<T: IteratorWriter<Element>> AppendClangOutputWriter<T> {
    pub(super) fn new(writer: T, input_path: &path::Path) -> Self {
        let path = if input_path.exists() {
            Some(input_path.to_path_buf())
        } else {
            log::debug!("The output file does not exist yet: {}", input_path.display());
            None
        };
        Self { writer, path }
    }

    fn read_from_compilation_db(source: &path::Path) -> Result<impl Iterator<Item = Element>, SerializationError> {
        let file = fs::File::open(source).map(io::BufReader::new)?;

        let elements = JsonCompilationDatabase::read_and_ignore(file, |error| {
            log::warn!("Problems to read previous entries: {error}");
        })
        .inspect(|element| {
            if let Element::Unrecognized(value) = element {
                log::warn!("Previous entry is not valid, it is kept as it is: {value}");
            }
        });
        Ok(elements)
    }
}

impl<T: IteratorWriter<Element>> IteratorWriter<Element> for AppendClangOutputWriter<T> {
    fn write(self, entries: impl Iterator<Item = Element>) -> Result<(), WriterError> {
        let previous: Vec<Element> = match &self.path {
            Some(path) => match Self::read_from_compilation_db(path) {
                Ok(previous) => previous.collect(),
                Err(error) => {
                    log::warn!("Previous entries are ignored, cannot read {}: {error}", path.display());
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        self.writer.write(previous.into_iter().chain(entries))
    }
}

/// Replaces the database with the temporary file when the writing succeeded.
///
/// The temporary file gets the permissions of the database it replaces.
/// The temporary file is removed when the writing failed.
pub(super) struct AtomicClangOutputWriter<T: IteratorWriter<Element>> {
    writer: T,
    temp_path: TempPath,
    final_path: path::PathBuf,
}

impl<T: IteratorWriter<Element>> AtomicClangOutputWriter<T> {
    pub(super) fn new(writer: T, temp_path: TempPath, final_path: &path::Path) -> Self {
        Self { writer, temp_path, final_path: final_path.to_path_buf() }
    }
}

impl<T: IteratorWriter<Element>> IteratorWriter<Element> for AtomicClangOutputWriter<T> {
    fn write(self, entries: impl Iterator<Item = Element>) -> Result<(), WriterError> {
        self.writer.write(entries)?;

        if let Ok(metadata) = fs::metadata(&self.final_path) {
            if let Err(error) = fs::set_permissions(&self.temp_path, metadata.permissions()) {
                log::warn!("Cannot keep the permissions of {}: {error}", self.final_path.display());
            }
        }
        self.temp_path.persist(&self.final_path).map_err(|err| WriterError::DatabaseUnwritable {
            path: self.final_path.clone(),
            source: SerializationError::Io(err.error),
        })?;

        Ok(())
    }
}

/// Writes the entries into a file.
pub(super) struct ClangOutputWriter {
    output: io::BufWriter<fs::File>,
    path: path::PathBuf,
}

impl ClangOutputWriter {
    /// The path is only used to report errors.
    pub(super) fn new(file: fs::File, path: &path::Path) -> Self {
        Self { output: io::BufWriter::new(file), path: path.to_path_buf() }
    }
}

impl IteratorWriter<Element> for ClangOutputWriter {
    fn write(self, entries: impl Iterator<Item = Element>) -> Result<(), WriterError> {
        JsonCompilationDatabase::write(self.output, entries)
            .map_err(|source| WriterError::DatabaseUnwritable { path: self.path, source })
    }
}
