// SPDX-License-Identifier: GPL-3.0-or-later

//! This program is called in place of `cl.exe`.
//!
//! It records the invocation as a clang compilation database entry, and then
//! calls the real compiler with the same arguments. The process exit code is
//! the exit code of the compiler.

use clear::{application, config, context, environment, invocation};
use std::env;
use std::io::Write;
use std::process::ExitCode;

/// Driver function of the application.
fn main() -> anyhow::Result<ExitCode> {
    // Initialize the logging system. Warnings are shown by default, because
    // the untranslatable flags are reported as warnings.
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(environment::KEY_LOG, "warn"))
        .format(|buf, record| {
            writeln!(buf, "[cl-ear/{}] {}: {}", std::process::id(), record.level(), record.args())
        })
        .init();
    let pkg_name = env!("CARGO_PKG_NAME");
    let pkg_version = env!("CARGO_PKG_VERSION");
    log::info!("{pkg_name} v{pkg_version}");
    let os = env::consts::OS;
    let family = env::consts::FAMILY;
    let arch = env::consts::ARCH;
    log::info!("Running on... {family}/{os} {arch}");

    // Capture application context.
    let context = context::Context::capture()?;
    log::info!("{context}");
    // Capture the compiler arguments.
    let invocation = invocation::Invocation::capture();
    log::info!("{invocation}");
    // Load the configuration.
    let configuration = config::Loader::load(&context)?;
    log::info!("{configuration}");

    // Run the application.
    let application = application::Application::configure(context, invocation, configuration);
    let result = application.run();
    log::debug!("Exit code: {result:?}");

    Ok(result)
}
