// SPDX-License-Identifier: GPL-3.0-or-later

pub mod application;
pub mod compilation;
pub mod config;
pub mod context;
pub mod environment;
pub mod execution;
pub mod invocation;
pub mod output;
pub mod paths;
pub mod translate;
