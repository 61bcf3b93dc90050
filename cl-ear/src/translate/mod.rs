// SPDX-License-Identifier: GPL-3.0-or-later

//! Translation of `cl.exe` command line tokens into clang flags.
//!
//! The translation works on single tokens. Before the tokens are translated,
//! the two-token macro definitions (`/D NAME`) have to be joined with
//! [`join_macro_definitions`], because the translator has no look-ahead.

pub mod rules;

pub use rules::{RuleClass, RuleTable};

use rules::{PRIORITY, SOURCE_DEFINE, SWITCH_MARKER, TARGET_DEFINE};
use thiserror::Error;

/// Joins `/D NAME` token pairs into a single `-DNAME` token.
///
/// A trailing `/D` without a value is left as it is. Merges never chain:
/// the token after a `/D` is taken as the value, whatever it looks like.
pub fn join_macro_definitions(arguments: Vec<String>) -> Vec<String> {
    let mut result = Vec::with_capacity(arguments.len());
    let mut iterator = arguments.into_iter();
    while let Some(argument) = iterator.next() {
        if argument == SOURCE_DEFINE {
            if let Some(value) = iterator.next() {
                result.push(format!("{TARGET_DEFINE}{value}"));
                continue;
            }
        }
        result.push(argument);
    }
    result
}

/// The outcome of translating a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// The token does not start with the switch marker. It is not translated,
    /// the caller decides what it is.
    NotAFlag,
    /// A rule matched. Ignored flags produce an empty list.
    Flags(Vec<String>),
    /// No rule matched. The flag produces nothing.
    Untranslatable(Untranslatable),
}

/// Diagnostic about a flag which has no rule in the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot translate flag: {flag}")]
pub struct Untranslatable {
    pub flag: String,
}

/// Rewrites switch-style flags with the rules of a [`RuleTable`].
///
/// The translator has no state besides the borrowed table, so translating
/// the same flag always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    rules: &'a RuleTable,
}

impl<'a> Translator<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self { rules }
    }

    pub fn translate(&self, token: &str) -> Translation {
        if !token.starts_with(SWITCH_MARKER) {
            return Translation::NotAFlag;
        }

        match PRIORITY.iter().find_map(|class| class.apply(self.rules, token)) {
            Some(flags) => {
                log::debug!("Flag translated: {token} -> {flags:?}");
                Translation::Flags(flags)
            }
            None => Translation::Untranslatable(Untranslatable { flag: token.to_string() }),
        }
    }
}
