// SPDX-License-Identifier: GPL-3.0-or-later

// https://learn.microsoft.com/en-us/cpp/build/reference/cl-environment-variables
pub const KEY_MSVC__INCLUDE: &str = "INCLUDE";
pub const KEY_MSVC__CL: &str = "CL";
pub const KEY_MSVC__CL_PREFIX: &str = "_CL_";

pub const KEY_CONFIG: &str = "CL_EAR_CONFIG";
pub const KEY_LOG: &str = "RUST_LOG";

/// Separator of the directory list in `INCLUDE`.
pub const INCLUDE_SEPARATOR: char = ';';

pub fn relevant_env(key: &str) -> bool {
    matches!(
        key.to_uppercase().as_str(),
        KEY_MSVC__INCLUDE | KEY_MSVC__CL | KEY_MSVC__CL_PREFIX | KEY_CONFIG | KEY_LOG
    )
}

/// Splits the value of `INCLUDE` into directories, dropping empty segments.
///
/// The segments are kept verbatim and in order.
pub fn split_include_paths(value: &str) -> Vec<String> {
    value
        .split(INCLUDE_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
