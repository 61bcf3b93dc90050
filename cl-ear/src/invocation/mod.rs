// SPDX-License-Identifier: GPL-3.0-or-later

//! The command line the program was invoked with.
//!
//! The program runs in place of `cl.exe`, so its arguments are the compiler
//! arguments. These are kept as they were given, because the real compiler
//! gets exactly the same list. For the recording, a response file argument
//! is expanded to the arguments it contains.

pub mod response;

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marks an argument which names a response file.
pub const RESPONSE_FILE_MARKER: char = '@';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The arguments without the program name, as the operating system
    /// passed them.
    pub arguments: Vec<OsString>,
}

impl Invocation {
    pub fn new<I, S>(arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self { arguments: arguments.into_iter().map(Into::into).collect() }
    }

    /// Captures the arguments of the current process.
    pub fn capture() -> Self {
        Self::new(std::env::args_os().skip(1))
    }

    /// The response file, when the only argument names one.
    pub fn response_file(&self) -> Option<String> {
        match self.arguments.as_slice() {
            [single] => single
                .to_string_lossy()
                .strip_prefix(RESPONSE_FILE_MARKER)
                .map(str::to_string),
            _ => None,
        }
    }

    /// The arguments to record, with the response file expanded.
    ///
    /// A relative response file path is resolved against the working
    /// directory. Arguments which are not valid Unicode are converted lossily.
    pub fn expand(&self, working_dir: &Path) -> Result<Vec<String>, InvocationError> {
        let Some(name) = self.response_file() else {
            return Ok(self
                .arguments
                .iter()
                .map(|argument| argument.to_string_lossy().into_owned())
                .collect());
        };

        let path = working_dir.join(name);
        log::debug!("Reading response file: {}", path.display());
        let arguments = response::read(&path)
            .map_err(|source| InvocationError::ResponseFileUnreadable { path, source })?;
        log::debug!("Response file arguments: {arguments:?}");
        Ok(arguments)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invocation: {:?}", self.arguments)
    }
}

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Failed to read response file '{path}': {source}")]
    ResponseFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn invocation(arguments: &[&str]) -> Invocation {
        Invocation::new(arguments.iter().copied())
    }

    #[test]
    fn test_response_file_detection() {
        assert_eq!(invocation(&["@args.rsp"]).response_file().as_deref(), Some("args.rsp"));
        assert_eq!(invocation(&["/c", "@args.rsp"]).response_file(), None);
        assert_eq!(invocation(&["a.cpp"]).response_file(), None);
        assert_eq!(invocation(&[]).response_file(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_arguments_are_kept_unchanged() {
        use std::os::unix::ffi::OsStringExt;

        let argument = OsString::from_vec(vec![b'a', 0xFF, b'.', b'c']);
        let sut = Invocation::new(vec![OsString::from("/c"), argument.clone()]);

        let result = sut.expand(Path::new("/nonexistent")).unwrap();

        assert_eq!(result, vec!["/c".to_string(), "a\u{FFFD}.c".to_string()]);
        assert_eq!(sut.arguments, vec![OsString::from("/c"), argument]);
    }

    #[test]
    fn test_expand_without_response_file() {
        let sut = invocation(&["/c", "a.cpp"]);

        let result = sut.expand(Path::new("/nonexistent")).unwrap();

        assert_eq!(result, vec!["/c", "a.cpp"]);
    }

    #[test]
    fn test_expand_response_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("args.txt"), "/c /W4 c.cpp").unwrap();
        let sut = invocation(&["@args.txt"]);

        let result = sut.expand(temp_dir.path()).unwrap();

        assert_eq!(result, vec!["/c", "/W4", "c.cpp"]);
        // The original arguments stay as they were given.
        assert_eq!(sut.arguments, vec!["@args.txt"]);
    }

    #[test]
    fn test_expand_absolute_response_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("args.txt");
        fs::write(&path, "/O2 a.cpp").unwrap();
        let sut = Invocation::new([format!("@{}", path.display())]);

        let result = sut.expand(Path::new("/nonexistent")).unwrap();

        assert_eq!(result, vec!["/O2", "a.cpp"]);
    }

    #[test]
    fn test_expand_missing_response_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sut = invocation(&["@missing.rsp"]);

        let result = sut.expand(temp_dir.path());

        match result {
            Err(error @ InvocationError::ResponseFileUnreadable { .. }) => {
                assert!(error.to_string().contains("missing.rsp"));
            }
            other => panic!("Expected ResponseFileUnreadable, got {other:?}"),
        }
    }
}
