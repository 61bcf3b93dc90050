// SPDX-License-Identifier: GPL-3.0-or-later

//! Reading of response files.
//!
//! Build systems on Windows pass long command lines to the compiler in a
//! response file. The file is usually UTF-16 with a byte order mark, and its
//! content follows the same quoting rules as a command line.
//!
//! The splitting follows the conventions of `CommandLineToArgvW` for the
//! arguments after the program name:
//!
//! - Space, tab, CR and LF separate arguments outside of quotes.
//! - A double quote toggles the quoted mode. Inside quotes, `""` is a
//!   literal quote and the quoted mode continues.
//! - `2n` backslashes followed by a quote produce `n` backslashes, and the
//!   quote toggles the quoted mode.
//! - `2n+1` backslashes followed by a quote produce `n` backslashes and a
//!   literal quote.
//! - Backslashes not followed by a quote are literal.
//! - A quoted empty string produces an empty argument.
//!
//! [`join`] is the inverse of [`split`]: it quotes the arguments which
//! would not survive the splitting otherwise.

use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use std::iter::{repeat_n, Peekable};
use std::path::Path;
use std::str::Chars;
use std::{fs, io};

/// Reads the response file and splits it into arguments.
pub fn read(path: &Path) -> io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    let content = decode(&bytes);
    Ok(split(&content))
}

/// Decodes the content by its byte order mark, UTF-8 when there is none.
///
/// The byte order mark itself is not part of the result.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let (encoding, bom_length) = Encoding::for_bom(bytes).unwrap_or((UTF_8, 0));
    let (content, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
    if had_errors {
        log::warn!("Response file is not valid {}, invalid sequences were replaced", encoding.name());
    }
    content
}

/// Splits the text into arguments.
pub fn split(text: &str) -> Vec<String> {
    let mut arguments = Vec::new();
    let mut chars = text.chars().peekable();
    loop {
        while chars.next_if(|c| is_separator(*c)).is_some() {}
        if chars.peek().is_none() {
            break;
        }
        arguments.push(next_argument(&mut chars));
    }
    arguments
}

fn next_argument(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut argument = String::new();
    let mut quoted = false;
    while let Some(&c) = chars.peek() {
        match c {
            '\\' => {
                let mut backslashes = 0;
                while chars.next_if_eq(&'\\').is_some() {
                    backslashes += 1;
                }
                if chars.peek() == Some(&'"') {
                    argument.extend(repeat_n('\\', backslashes / 2));
                    if backslashes % 2 == 1 {
                        chars.next();
                        argument.push('"');
                    }
                } else {
                    argument.extend(repeat_n('\\', backslashes));
                }
            }
            '"' => {
                chars.next();
                if quoted && chars.next_if_eq(&'"').is_some() {
                    argument.push('"');
                } else {
                    quoted = !quoted;
                }
            }
            c if is_separator(c) && !quoted => break,
            c => {
                chars.next();
                argument.push(c);
            }
        }
    }
    argument
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Joins the arguments into a single command line.
pub fn join<S: AsRef<str>>(arguments: &[S]) -> String {
    arguments
        .iter()
        .map(|argument| quote(argument.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quotes the argument when it is empty, or it has a separator or a quote.
pub fn quote(argument: &str) -> Cow<'_, str> {
    if !argument.is_empty() && !argument.chars().any(|c| c == '"' || is_separator(c)) {
        return Cow::Borrowed(argument);
    }

    let mut quoted = String::with_capacity(argument.len() + 2);
    quoted.push('"');
    let mut chars = argument.chars().peekable();
    loop {
        let mut backslashes = 0;
        while chars.next_if_eq(&'\\').is_some() {
            backslashes += 1;
        }
        match chars.next() {
            None => {
                // The closing quote must not be escaped.
                quoted.extend(repeat_n('\\', backslashes * 2));
                break;
            }
            Some('"') => {
                quoted.extend(repeat_n('\\', backslashes * 2 + 1));
                quoted.push('"');
            }
            Some(c) => {
                quoted.extend(repeat_n('\\', backslashes));
                quoted.push(c);
            }
        }
    }
    quoted.push('"');
    Cow::Owned(quoted)
}
