// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! # Runtime Selection
//!
//! Picks the runtime backend for one launcher invocation:
//!
//! 1. Resolve the `runtime` name (`--Druntime=` > `fan_runtime` >
//!    config.props > `java`).
//! 2. Map it to a [`Runtime`]; anything else is fatal.
//! 3. Stub tools are pinned to their own runtime.
//! 4. The `Fan` tool may swap the home directory through
//!    `runtime.substitutes` when the script being run is listed there.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{LaunchError, LaunchResult},
    overlay::{ConfigOverlay, RUNTIME_PROP},
    substitutes::{self, SUBSTITUTES_PROP},
};

/// Runtime used when nothing else names one
pub const DEFAULT_RUNTIME: &str = "java";

/// Runtime backend hosting the Fan application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Java,
    Dotnet,
}

impl FromStr for Runtime {
    type Err = LaunchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "java" => Ok(Runtime::Java),
            "dotnet" => Ok(Runtime::Dotnet),
            other => Err(LaunchError::UnknownRuntime(other.to_string())),
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runtime::Java => f.write_str("java"),
            Runtime::Dotnet => f.write_str("dotnet"),
        }
    }
}

/// Logical role of a launcher binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    /// Interactive script runner
    Fan,
    /// Test runner
    Fant,
    /// Pod disassembler
    Fanp,
    /// Java stub generator, always on the Java runtime
    Jstub,
    /// .NET stub generator, always on the .NET runtime
    Nstub,
}

impl Tool {
    pub const ALL: [Tool; 5] = [Tool::Fan, Tool::Fant, Tool::Fanp, Tool::Jstub, Tool::Nstub];

    /// Class name of the tool's main under `fanx.tools`
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Fan => "Fan",
            Tool::Fant => "Fant",
            Tool::Fanp => "Fanp",
            Tool::Jstub => "Jstub",
            Tool::Nstub => "Nstub",
        }
    }

    /// Runtime a single-backend tool is pinned to
    pub fn forced_runtime(&self) -> Option<Runtime> {
        match self {
            Tool::Jstub => Some(Runtime::Java),
            Tool::Nstub => Some(Runtime::Dotnet),
            _ => None,
        }
    }

    /// Whether `runtime.substitutes` is honoured for this tool
    pub fn uses_substitutes(&self) -> bool {
        matches!(self, Tool::Fan)
    }

    /// Entry point identifier handed to `runtime`
    pub fn entry_point(&self, runtime: Runtime) -> String {
        match runtime {
            Runtime::Java => format!("fanx.tools.{}", self.name()),
            Runtime::Dotnet => format!("Fanx.Tools.{}", self.name()),
        }
    }

    /// Tool for a launcher executable, judged by its file stem.
    pub fn from_exe_path(path: &Path) -> Option<Tool> {
        let stem = path.file_stem()?.to_str()?;
        stem.parse().ok()
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tool '{}'", s))
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of runtime selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub runtime: Runtime,
    pub home: PathBuf,
}

/// Chooses the runtime and home directory for a tool
#[derive(Debug, Clone)]
pub struct RuntimeSelector {
    tool: Tool,
    cwd: PathBuf,
}

impl RuntimeSelector {
    /// `cwd` resolves relative script paths for substitution matching.
    pub fn new(tool: Tool, cwd: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            cwd: cwd.into(),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn select(
        &self,
        overlay: &ConfigOverlay<'_>,
        home: &Path,
        forwarded: &[String],
    ) -> LaunchResult<Selection> {
        let runtime = self.resolve_runtime(overlay)?;
        let home = self
            .substitute_home(overlay, forwarded)
            .unwrap_or_else(|| home.to_path_buf());
        Ok(Selection { runtime, home })
    }

    fn resolve_runtime(&self, overlay: &ConfigOverlay<'_>) -> LaunchResult<Runtime> {
        let name = overlay.lookup_or(RUNTIME_PROP, DEFAULT_RUNTIME);
        debug!("runtime = {}", name);
        let runtime: Runtime = name.parse()?;
        Ok(self.tool.forced_runtime().unwrap_or(runtime))
    }

    fn substitute_home(
        &self,
        overlay: &ConfigOverlay<'_>,
        forwarded: &[String],
    ) -> Option<PathBuf> {
        if !self.tool.uses_substitutes() {
            return None;
        }
        let target = forwarded.first()?;
        let value = overlay.lookup(SUBSTITUTES_PROP)?;

        debug!("check substitutes");
        let target_uri = substitutes::script_uri(target, &self.cwd);
        debug!("  target uri = {}", target_uri);

        match substitutes::find_substitute(value, &target_uri) {
            Ok(Some(runtime_home)) => {
                debug!("  substitute home = {}", runtime_home);
                Some(PathBuf::from(runtime_home))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}
