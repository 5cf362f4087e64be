// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! # Fan Launcher Library
//!
//! Core of the native `fan` bootstrapper. At process start it decides which
//! runtime hosts a Fan tool and hands control to it:
//! - `config.props` parsing with comments, escapes and line continuation
//! - `--v` / `--Dname=value` launcher flags split from forwarded arguments
//! - runtime selection across config, environment and command line
//! - per-script runtime substitution for boot builds
//! - Java and .NET process backends
//!
//! The `fanprops` binary exposes the same pipeline for inspection.

pub mod args;
pub mod backend;
pub mod cli;
pub mod error;
pub mod launcher;
pub mod overlay;
pub mod props;
pub mod runtime;
pub mod substitutes;

pub use crate::error::{LaunchError, LaunchResult};
pub use crate::launcher::{LaunchOptions, LaunchPlan};
pub use crate::overlay::{ConfigOverlay, EnvOverrides};
pub use crate::props::{Prop, Props, PropsError, SyntaxErrorKind};
pub use crate::runtime::{Runtime, RuntimeSelector, Selection, Tool};
