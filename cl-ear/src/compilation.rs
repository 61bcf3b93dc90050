// SPDX-License-Identifier: GPL-3.0-or-later

//! Builds compilation database entries from a `cl.exe` invocation.
//!
//! The builder joins the macro definitions, translates the flags, separates
//! the input files from the flags and produces one [`CompileCommand`] for each
//! input file. All commands of one invocation share the directory and the
//! flags; they differ only in the file.

use crate::paths;
use crate::translate::rules::{TARGET_INCLUDE, TARGET_MARKER};
use crate::translate::{join_macro_definitions, RuleTable, Translation, Translator, Untranslatable};

/// Flags which make clang accept the MSVC language extensions.
///
/// These are always the first flags of a command, in this order.
pub const COMPATIBILITY_FLAGS: [&str; 3] = [
    "-fdelayed-template-parsing",
    "-fms-extensions",
    "-fms-compatibility",
];

/// A translated compiler invocation for a single input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    /// The working directory with forward slashes.
    pub directory: String,
    /// The input file joined to the working directory, with forward slashes.
    pub file: String,
    /// The translated flags, the file is the last element.
    pub arguments: Vec<String>,
}

/// The result of processing one invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Compilation {
    pub commands: Vec<CompileCommand>,
    /// Flags which could not be translated, in the order they were found.
    pub diagnostics: Vec<Untranslatable>,
}

pub struct CompilationBuilder<'a> {
    translator: Translator<'a>,
    system_includes: Vec<String>,
    compiler: Option<String>,
}

impl<'a> CompilationBuilder<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self {
            translator: Translator::new(rules),
            system_includes: Vec::new(),
            compiler: None,
        }
    }

    /// System include directories, added after the compatibility flags.
    /// Empty entries are skipped.
    pub fn with_system_includes(mut self, directories: Vec<String>) -> Self {
        self.system_includes = directories;
        self
    }

    /// Executable name to put in front of every command.
    pub fn with_compiler(mut self, compiler: Option<String>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn build(&self, directory: &str, arguments: Vec<String>) -> Compilation {
        let mut flags: Vec<String> = self.compiler.iter().cloned().collect();
        flags.extend(COMPATIBILITY_FLAGS.iter().map(|flag| flag.to_string()));
        flags.extend(
            self.system_includes
                .iter()
                .filter(|include| !include.is_empty())
                .map(|include| format!("{TARGET_INCLUDE}{include}")),
        );

        let mut sources = Vec::new();
        let mut diagnostics = Vec::new();
        for argument in join_macro_definitions(arguments) {
            match self.translator.translate(&argument) {
                Translation::Flags(translated) => flags.extend(translated),
                Translation::Untranslatable(diagnostic) => diagnostics.push(diagnostic),
                Translation::NotAFlag if argument.starts_with(TARGET_MARKER) => flags.push(argument),
                Translation::NotAFlag if argument.is_empty() => {
                    log::debug!("Empty argument skipped");
                }
                Translation::NotAFlag => sources.push(argument),
            }
        }

        let directory = paths::normalize(directory);
        let commands = sources
            .iter()
            .map(|source| {
                let file = paths::join(&directory, source);
                let mut arguments = flags.clone();
                arguments.push(file.clone());
                CompileCommand { directory: directory.clone(), file, arguments }
            })
            .collect();

        Compilation { commands, diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn with_compatibility(values: &[&str]) -> Vec<String> {
        let mut result = strings(&COMPATIBILITY_FLAGS);
        result.extend(strings(values));
        result
    }

    #[test]
    fn test_single_file_invocation() {
        let sut = CompilationBuilder::new(RuleTable::msvc());

        let result = sut.build(r"C:\proj", strings(&["/c", "/O2", "/Zi", "/D", "FOO", "a.cpp"]));

        assert_eq!(
            result,
            Compilation {
                commands: vec![CompileCommand {
                    directory: "C:/proj".to_string(),
                    file: "C:/proj/a.cpp".to_string(),
                    arguments: with_compatibility(&["-c", "-O2", "-g", "-DFOO", "C:/proj/a.cpp"]),
                }],
                diagnostics: vec![],
            }
        );
    }

    #[test]
    fn test_unknown_flag_is_dropped_and_reported() {
        let sut = CompilationBuilder::new(RuleTable::msvc());

        let result = sut.build(r"C:\proj", strings(&["/Od", "/UNKNOWNFLAG", "b.c"]));

        assert_eq!(result.commands.len(), 1);
        assert_eq!(result.commands[0].arguments, with_compatibility(&["-O0", "C:/proj/b.c"]));
        assert_eq!(result.diagnostics, vec![Untranslatable { flag: "/UNKNOWNFLAG".to_string() }]);
    }

    #[test]
    fn test_each_input_file_gets_an_entry() {
        let sut = CompilationBuilder::new(RuleTable::msvc());

        let result = sut.build("/work", strings(&["a.cpp", "/W4", "b.cpp"]));

        assert_eq!(result.commands.len(), 2);
        let (first, second) = (&result.commands[0], &result.commands[1]);
        assert_eq!(first.file, "/work/a.cpp");
        assert_eq!(second.file, "/work/b.cpp");
        assert_eq!(first.directory, second.directory);
        assert_eq!(first.arguments.last(), Some(&first.file));
        assert_eq!(second.arguments.last(), Some(&second.file));
        assert_eq!(
            first.arguments[..first.arguments.len() - 1],
            second.arguments[..second.arguments.len() - 1]
        );
    }

    #[test]
    fn test_no_input_files_no_entries() {
        let sut = CompilationBuilder::new(RuleTable::msvc());

        let result = sut.build("/work", strings(&["/c", "/nologo"]));

        assert!(result.commands.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_system_includes_follow_compatibility_flags() {
        let sut = CompilationBuilder::new(RuleTable::msvc()).with_system_includes(strings(&[
            r"C:\VC\include",
            "",
            r"C:\SDK\ucrt",
        ]));

        let result = sut.build(r"C:\proj", strings(&["/Iinc", "a.c"]));

        assert_eq!(
            result.commands[0].arguments,
            with_compatibility(&[r"-IC:\VC\include", r"-IC:\SDK\ucrt", "-Iinc", "C:/proj/a.c"])
        );
    }

    #[test]
    fn test_dash_flags_are_kept() {
        let sut = CompilationBuilder::new(RuleTable::msvc());

        let result = sut.build("/work", strings(&["-DALREADY", "-c", "a.c"]));

        assert_eq!(result.commands[0].arguments, with_compatibility(&["-DALREADY", "-c", "/work/a.c"]));
    }

    #[test]
    fn test_compiler_is_prepended() {
        let sut = CompilationBuilder::new(RuleTable::msvc()).with_compiler(Some("clang-cl".to_string()));

        let result = sut.build("/work", strings(&["/c", "a.c"]));

        let arguments = &result.commands[0].arguments;
        assert_eq!(arguments.first().map(String::as_str), Some("clang-cl"));
        assert_eq!(arguments[1], COMPATIBILITY_FLAGS[0]);
    }

    #[test]
    fn test_absolute_input_file_is_kept() {
        let sut = CompilationBuilder::new(RuleTable::msvc());

        let result = sut.build(r"C:\proj", strings(&[r"D:\src\main.cpp"]));

        assert_eq!(result.commands[0].file, "D:/src/main.cpp");
        assert_eq!(result.commands[0].directory, "C:/proj");
    }
}
