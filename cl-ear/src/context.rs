// SPDX-License-Identifier: GPL-3.0-or-later

use crate::environment;
use anyhow::{Context as AnyhowContext, Result};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Application context containing runtime environment information.
///
/// Captured once at startup, so the later phases can work without reading
/// the process state again.
#[derive(Debug, Clone)]
pub struct Context {
    /// Current working directory when the compiler was invoked
    pub current_directory: PathBuf,
    /// All environment variables at startup
    pub environment: HashMap<String, String>,
}

impl Context {
    pub fn capture() -> Result<Self> {
        let current_directory =
            env::current_dir().with_context(|| "Failed to get current working directory")?;

        let environment = env::vars_os()
            .map(|(key, value)| (key.to_string_lossy().into_owned(), value.to_string_lossy().into_owned()))
            .collect::<HashMap<String, String>>();

        Ok(Context { current_directory, environment })
    }

    /// Looks up an environment variable.
    ///
    /// The lookup is case insensitive, as it is on Windows.
    pub fn variable(&self, key: &str) -> Option<&str> {
        self.environment
            .get(key)
            .or_else(|| {
                self.environment
                    .iter()
                    .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// The system include directories from the `INCLUDE` variable.
    pub fn system_includes(&self) -> Vec<String> {
        self.variable(environment::KEY_MSVC__INCLUDE)
            .map(environment::split_include_paths)
            .unwrap_or_default()
    }

    /// The configuration file named by the environment, if any.
    pub fn config_override(&self) -> Option<PathBuf> {
        self.variable(environment::KEY_CONFIG)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Application Context:")?;
        writeln!(f, "Current Directory: {}", self.current_directory.display())?;
        writeln!(f, "Total Environment Variables: {} entries", self.environment.len())?;

        writeln!(f, "Relevant Environment Variables:")?;
        let mut relevant: Vec<_> = self
            .environment
            .iter()
            .filter(|(key, _)| environment::relevant_env(key))
            .collect();
        relevant.sort();
        for (key, value) in relevant {
            writeln!(f, "  {key}={value}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(variables: &[(&str, &str)]) -> Context {
        Context {
            current_directory: PathBuf::from("/work"),
            environment: variables.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[test]
    fn test_context_capture() {
        let context = Context::capture().unwrap();

        assert!(context.current_directory.is_absolute());
    }

    #[test]
    fn test_system_includes() {
        let context = context_with(&[("INCLUDE", r"C:\VC\include;;C:\SDK\um")]);

        assert_eq!(context.system_includes(), vec![r"C:\VC\include", r"C:\SDK\um"]);
    }

    #[test]
    fn test_system_includes_case_insensitive() {
        let context = context_with(&[("Include", r"C:\VC\include")]);

        assert_eq!(context.system_includes(), vec![r"C:\VC\include"]);
    }

    #[test]
    fn test_system_includes_missing() {
        let context = context_with(&[("PATH", "/usr/bin")]);

        assert!(context.system_includes().is_empty());
    }

    #[test]
    fn test_config_override() {
        assert_eq!(
            context_with(&[("CL_EAR_CONFIG", "/etc/cl-ear.yml")]).config_override(),
            Some(PathBuf::from("/etc/cl-ear.yml"))
        );
        assert_eq!(context_with(&[("CL_EAR_CONFIG", "")]).config_override(), None);
        assert_eq!(context_with(&[]).config_override(), None);
    }

    #[test]
    fn test_display_includes_relevant_env_vars() {
        let context = context_with(&[
            ("INCLUDE", r"C:\VC\include"),
            ("IRRELEVANT_VAR", "value"),
        ]);

        let display_output = format!("{context}");

        assert!(display_output.contains("Application Context:"));
        assert!(display_output.contains(r"INCLUDE=C:\VC\include"));
        assert!(!display_output.contains("IRRELEVANT_VAR=value"));
        assert!(display_output.contains("Total Environment Variables: 2 entries"));
    }
}
