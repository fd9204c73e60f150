//! Core support for the tgr3d shader compiler
//!
//! This crate provides the error taxonomy, configuration, and logging
//! infrastructure shared by the compiler and its command-line front end.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CompilerConfig, Config, DebugConfig, LogLevel};
pub use error::{CompileError, ConflictError, Resource, Result, Stage, UnsupportedError};
