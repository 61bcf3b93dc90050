// SPDX-License-Identifier: GPL-3.0-or-later

//! This module defines the configuration of the application.
//!
//! The configuration is either loaded from a file or used with default
//! values, which are defined in the code. Since the program is invoked in
//! place of the compiler, there are no command line options to carry these
//! settings.
//!
//! The configuration file syntax is based on the YAML format.
//! The default configuration file name is `cl-ear.yml`.
//!
//! The configuration file location is searched in the following order:
//! 1. The file named by the `CL_EAR_CONFIG` environment variable
//! 2. The current working directory
//! 3. The local configuration directory of the user
//! 4. The configuration directory of the user
//! 5. The local configuration directory of the application
//! 6. The configuration directory of the application
//!
//! ```yaml
//! schema: "1.0"
//!
//! output:
//!   path: compile_commands.json
//!   compiler: clang-cl
//!
//! compiler:
//!   path: C:/BuildTools/VC/bin/cl.exe
//!   forward: true
//! ```

// Re-Export the types and the loader module content.
pub use loader::{ConfigError, Loader};
pub use types::*;
pub use validation::Validator;

mod types {
    use serde::Deserialize;
    use std::fmt;
    use std::path::PathBuf;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    pub struct Main {
        #[serde(deserialize_with = "validate_schema_version")]
        pub schema: String,
        #[serde(default)]
        pub output: Output,
        #[serde(default)]
        pub compiler: Compiler,
    }

    impl Default for Main {
        fn default() -> Self {
            Self {
                schema: String::from(SUPPORTED_SCHEMA_VERSION),
                output: Output::default(),
                compiler: Compiler::default(),
            }
        }
    }

    impl fmt::Display for Main {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "Configuration:")?;
            writeln!(f, "schema: {}", self.schema)?;
            writeln!(f, "output:")?;
            writeln!(f, "  path: {}", self.output.path.display())?;
            if let Some(compiler) = &self.output.compiler {
                writeln!(f, "  compiler: {compiler}")?;
            }
            writeln!(f, "compiler:")?;
            writeln!(f, "  path: {}", self.compiler.path.display())?;
            writeln!(f, "  forward: {}", self.compiler.forward)
        }
    }

    /// Where and how the compilation database is written.
    #[derive(Clone, Debug, PartialEq, serde::Deserialize)]
    pub struct Output {
        /// Relative paths are resolved against the working directory.
        #[serde(default = "default_output_path")]
        pub path: PathBuf,
        /// Put in front of every recorded command.
        #[serde(default)]
        pub compiler: Option<String>,
    }

    impl Default for Output {
        fn default() -> Self {
            Self { path: default_output_path(), compiler: None }
        }
    }

    /// The real compiler, which gets the original arguments after recording.
    #[derive(Clone, Debug, PartialEq, serde::Deserialize)]
    pub struct Compiler {
        #[serde(default = "default_compiler_path")]
        pub path: PathBuf,
        #[serde(default = "default_enabled")]
        pub forward: bool,
    }

    impl Default for Compiler {
        fn default() -> Self {
            Self { path: default_compiler_path(), forward: true }
        }
    }

    const SUPPORTED_SCHEMA_VERSION: &str = "1.0";
    const DEFAULT_OUTPUT_PATH: &str = "compile_commands.json";
    const DEFAULT_COMPILER_PATH: &str = "cl.exe";

    fn default_output_path() -> PathBuf {
        PathBuf::from(DEFAULT_OUTPUT_PATH)
    }

    fn default_compiler_path() -> PathBuf {
        PathBuf::from(DEFAULT_COMPILER_PATH)
    }

    fn default_enabled() -> bool {
        true
    }

    // Custom deserialization function to validate the schema version
    fn validate_schema_version<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let schema: String = Deserialize::deserialize(deserializer)?;
        if schema != SUPPORTED_SCHEMA_VERSION {
            use serde::de::Error;
            Err(Error::custom(format!(
                "Unsupported schema version: {schema}. Expected: {SUPPORTED_SCHEMA_VERSION}"
            )))
        } else {
            Ok(schema)
        }
    }
}

pub mod validation {

    use super::types::*;
    use thiserror::Error;

    pub trait Validator<T> {
        type Error: std::error::Error;

        fn validate(config: &T) -> Result<(), Self::Error>;
    }

    #[derive(Debug, Error)]
    pub enum ValidationError {
        #[error("Empty string value for field '{field}'")]
        EmptyString { field: &'static str },
        #[error("Multiple validation errors: {errors:?}")]
        Multiple { errors: Vec<ValidationError> },
    }

    #[derive(Default)]
    struct ValidationCollector {
        errors: Vec<ValidationError>,
    }

    impl ValidationCollector {
        fn add(&mut self, error: ValidationError) {
            self.errors.push(error);
        }

        fn add_result(&mut self, result: Result<(), ValidationError>) {
            if let Err(error) = result {
                match error {
                    ValidationError::Multiple { errors } => self.errors.extend(errors),
                    single_error => self.errors.push(single_error),
                }
            }
        }

        fn finish(mut self) -> Result<(), ValidationError> {
            match self.errors.len() {
                0 => Ok(()),
                1 => Err(self.errors.remove(0)),
                _ => Err(ValidationError::Multiple { errors: self.errors }),
            }
        }
    }

    impl Validator<Main> for Main {
        type Error = ValidationError;

        fn validate(config: &Main) -> Result<(), Self::Error> {
            let mut collector = ValidationCollector::default();

            collector.add_result(Output::validate(&config.output));
            collector.add_result(Compiler::validate(&config.compiler));

            collector.finish()
        }
    }

    impl Validator<Output> for Output {
        type Error = ValidationError;

        fn validate(config: &Output) -> Result<(), Self::Error> {
            let mut collector = ValidationCollector::default();

            if config.path.as_os_str().is_empty() {
                collector.add(ValidationError::EmptyString { field: "output.path" });
            }
            if config.compiler.as_deref().is_some_and(str::is_empty) {
                collector.add(ValidationError::EmptyString { field: "output.compiler" });
            }

            collector.finish()
        }
    }

    impl Validator<Compiler> for Compiler {
        type Error = ValidationError;

        fn validate(config: &Compiler) -> Result<(), Self::Error> {
            // The path only matters when it is executed.
            if config.forward && config.path.as_os_str().is_empty() {
                Err(ValidationError::EmptyString { field: "compiler.path" })
            } else {
                Ok(())
            }
        }
    }

}

pub mod loader {
    use super::{Main, Validator};
    use crate::context::Context;
    use directories::{BaseDirs, ProjectDirs};
    use log::{debug, info};
    use std::fs;
    use std::path::{Path, PathBuf};
    use thiserror::Error;

    const CONFIG_FILE_NAME: &str = "cl-ear.yml";

    pub struct Loader {}

    impl Loader {
        /// Loads the configuration from the file named by the environment or
        /// from the default locations.
        ///
        /// When no configuration file is found, the default configuration is
        /// returned. A file which is found but cannot be used is an error.
        pub fn load(context: &Context) -> Result<Main, ConfigError> {
            if let Some(path) = context.config_override() {
                return Self::from_file(&path);
            }

            for location in Self::file_locations(context) {
                debug!("Checking configuration file: {}", location.display());
                if location.exists() {
                    return Self::from_file(location.as_path());
                }
            }
            debug!("Configuration file not found. Using the default configuration.");
            Ok(Main::default())
        }

        /// The default locations where the configuration file can be found.
        fn file_locations(context: &Context) -> Vec<PathBuf> {
            let mut locations = vec![context.current_directory.clone()];

            if let Some(base_dirs) = BaseDirs::new() {
                locations.push(base_dirs.config_local_dir().to_path_buf());
                locations.push(base_dirs.config_dir().to_path_buf());
            }
            if let Some(proj_dirs) = ProjectDirs::from("", "", "cl-ear") {
                locations.push(proj_dirs.config_local_dir().to_path_buf());
                locations.push(proj_dirs.config_dir().to_path_buf());
            }
            // On most platforms the local and roaming directories are the same.
            locations.dedup();

            locations.iter().map(|p| p.join(CONFIG_FILE_NAME)).collect()
        }

        /// Loads the configuration from the specified file.
        pub fn from_file(path: &Path) -> Result<Main, ConfigError> {
            info!("Loading configuration file: {}", path.display());

            let content = fs::read_to_string(path)
                .map_err(|source| ConfigError::FileAccess { path: path.to_path_buf(), source })?;

            let config = Self::from_str(&content)
                .map_err(|source| ConfigError::ParseError { path: path.to_path_buf(), source })?;

            Main::validate(&config)
                .map_err(|source| ConfigError::ValidationError { path: path.to_path_buf(), source })?;

            Ok(config)
        }

        /// Define the deserialization format of the config file.
        fn from_str(content: &str) -> Result<Main, serde_saphyr::Error> {
            serde_saphyr::from_str(content)
        }
    }

    /// Represents all possible configuration-related errors.
    #[derive(Debug, Error)]
    pub enum ConfigError {
        #[error("Failed to access configuration file '{path}': {source}")]
        FileAccess {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("Failed to parse configuration from file '{path}': {source}")]
        ParseError {
            path: PathBuf,
            #[source]
            source: serde_saphyr::Error,
        },
        #[error("Configuration validation failed for file '{path}': {source}")]
        ValidationError {
            path: PathBuf,
            #[source]
            source: super::validation::ValidationError,
        },
    }

}
