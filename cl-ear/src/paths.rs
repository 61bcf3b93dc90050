// SPDX-License-Identifier: GPL-3.0-or-later

//! Textual path helpers for the compilation database.
//!
//! Paths in the database use forward slashes on every platform, and they are
//! handled as strings: the recorded invocation may come from a Windows build
//! while the tools reading the database run elsewhere.

/// Replaces every backslash with a forward slash.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Checks a normalized path for a root, a drive (`C:/`) or a UNC prefix.
pub fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

/// Joins the path to the directory, unless the path is absolute already.
///
/// The result is normalized.
pub fn join(directory: &str, path: &str) -> String {
    let path = normalize(path);
    if is_absolute(&path) {
        return path;
    }
    let directory = normalize(directory);
    let path = path.strip_prefix("./").unwrap_or(&path);
    format!("{}/{}", directory.trim_end_matches('/'), path)
}
