// SPDX-License-Identifier: GPL-3.0-or-later

//! The steps of one compiler invocation.
//!
//! First the invocation is recorded into the compilation database, then the
//! real compiler is executed with the original arguments. When the recording
//! fails, the compiler is not executed.

use crate::compilation::CompilationBuilder;
use crate::config;
use crate::context::Context;
use crate::execution::{self, Execution};
use crate::invocation::Invocation;
use crate::output::OutputWriter;
use crate::translate::RuleTable;
use anyhow::Result;
use std::process::{ExitCode, ExitStatus};

pub struct Application {
    context: Context,
    invocation: Invocation,
    config: config::Main,
}

impl Application {
    pub fn configure(context: Context, invocation: Invocation, config: config::Main) -> Self {
        Self { context, invocation, config }
    }

    /// Runs the application and returns the process exit code.
    ///
    /// Untranslatable flags are reported, but do not change the exit code.
    pub fn run(self) -> ExitCode {
        if let Err(error) = self.record() {
            log::error!("cl-ear: {error}");
            return ExitCode::FAILURE;
        }

        if !self.config.compiler.forward {
            log::debug!("Forwarding to the compiler is disabled");
            return ExitCode::SUCCESS;
        }
        match self.forward() {
            Ok(exit_status) => exit_code(exit_status),
            Err(error) => {
                log::error!("cl-ear: {error}");
                ExitCode::FAILURE
            }
        }
    }

    /// Translates the invocation and appends the result to the database.
    fn record(&self) -> Result<()> {
        let arguments = self.invocation.expand(&self.context.current_directory)?;

        let builder = CompilationBuilder::new(RuleTable::msvc())
            .with_system_includes(self.context.system_includes())
            .with_compiler(self.config.output.compiler.clone());
        let directory = self.context.current_directory.to_string_lossy();
        let compilation = builder.build(&directory, arguments);

        for diagnostic in &compilation.diagnostics {
            log::warn!("{diagnostic}");
        }
        log::debug!("Recording {} entries", compilation.commands.len());

        let path = self.context.current_directory.join(&self.config.output.path);
        OutputWriter::create(&path)?.write(compilation.commands.into_iter())?;
        Ok(())
    }

    fn forward(&self) -> Result<ExitStatus> {
        let execution = Execution {
            executable: self.config.compiler.path.clone(),
            arguments: self.invocation.arguments.clone(),
            working_dir: self.context.current_directory.clone(),
        };
        log::debug!("{execution}");

        Ok(execution::supervise(execution)?)
    }
}

/// The exit code is not available when the process was killed by a signal,
/// then it is a failure.
fn exit_code(exit_status: ExitStatus) -> ExitCode {
    exit_status
        .code()
        .map(|code| ExitCode::from(code as u8))
        .unwrap_or(ExitCode::FAILURE)
}
