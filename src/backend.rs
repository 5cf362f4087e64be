// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! # Runtime Backends
//!
//! Hand-off from the launcher to the runtime that executes the Fan tool.
//! Each backend receives the Fan home directory, the forwarded arguments and
//! the tool's entry point, runs the runtime as a child process and reports
//! its exit code.
//!
//! - Java: `{java} -Djava.class.path={home}/lib/java/sys.jar
//!   -Dfan.home={home} {java.options} fanx.tools.{Tool} {args}`
//! - .NET: `{dotnet.host} {home}/lib/dotnet/sys.dll Fanx.Tools.{Tool} {args}`
//!   with `FAN_HOME` set to the home directory

use std::{
    env,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

use log::debug;

use crate::{
    error::{LaunchError, LaunchResult},
    props::Props,
    runtime::Runtime,
};

/// Property naming the Java launcher executable
pub const JAVA_JVM_PROP: &str = "java.jvm";

/// Property holding extra JVM options
pub const JAVA_OPTIONS_PROP: &str = "java.options";

/// Property naming the CLR host executable
pub const DOTNET_HOST_PROP: &str = "dotnet.host";

/// Upper bound on options passed to the JVM, including the predefined ones
pub const MAX_JAVA_OPTIONS: usize = 32;

/// Everything a backend needs to start the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub home: PathBuf,
    pub args: Vec<String>,
    pub entry_point: String,
}

/// A runtime able to run a Fan entry point
#[cfg_attr(test, mockall::automock)]
pub trait RuntimeBackend {
    fn runtime(&self) -> Runtime;

    /// Run the entry point and return its exit code.
    fn launch(&self, request: &LaunchRequest) -> LaunchResult<i32>;
}

/// Build the backend for `runtime`, configured from `props`.
pub fn for_runtime(runtime: Runtime, props: &Props) -> Box<dyn RuntimeBackend> {
    match runtime {
        Runtime::Java => Box::new(JavaBackend::from_props(props)),
        Runtime::Dotnet => Box::new(DotnetBackend::from_props(props)),
    }
}

fn exit_code(program: &Path, status: ExitStatus) -> LaunchResult<i32> {
    debug!("  {} exited with {}", program.display(), status);
    status
        .code()
        .ok_or_else(|| LaunchError::Backend(format!("{} terminated by signal", program.display())))
}

/// Java VM launched through the `java` executable
#[derive(Debug, Clone)]
pub struct JavaBackend {
    java: PathBuf,
    options: Vec<String>,
}

impl JavaBackend {
    pub fn from_props(props: &Props) -> Self {
        let java = match props.get(JAVA_JVM_PROP) {
            Some(jvm) => PathBuf::from(jvm),
            None => env::var_os("JAVA_HOME")
                .map(|home| Path::new(&home).join("bin").join("java"))
                .unwrap_or_else(|| PathBuf::from("java")),
        };
        let options = props
            .get_or(JAVA_OPTIONS_PROP, "")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        Self { java, options }
    }

    /// Full JVM option list: class path, `fan.home`, then configured options.
    pub fn vm_options(&self, home: &Path) -> Vec<String> {
        let mut options = vec![
            format!(
                "-Djava.class.path={}",
                home.join("lib").join("java").join("sys.jar").display()
            ),
            format!("-Dfan.home={}", home.display()),
        ];
        let room = MAX_JAVA_OPTIONS - options.len();
        options.extend(self.options.iter().take(room).cloned());
        options
    }

    pub fn command(&self, request: &LaunchRequest) -> Command {
        let mut cmd = Command::new(&self.java);
        cmd.args(self.vm_options(&request.home))
            .arg(&request.entry_point)
            .args(&request.args);
        cmd
    }
}

impl RuntimeBackend for JavaBackend {
    fn runtime(&self) -> Runtime {
        Runtime::Java
    }

    fn launch(&self, request: &LaunchRequest) -> LaunchResult<i32> {
        debug!("launch java");
        debug!("  java = {}", self.java.display());
        for option in self.vm_options(&request.home) {
            debug!("    {}", option);
        }
        let status = self.command(request).status().map_err(|e| {
            LaunchError::Backend(format!("Cannot launch Java VM {}: {}", self.java.display(), e))
        })?;
        exit_code(&self.java, status)
    }
}

/// CLR host running `sys.dll`
#[derive(Debug, Clone)]
pub struct DotnetBackend {
    host: PathBuf,
}

impl DotnetBackend {
    pub fn from_props(props: &Props) -> Self {
        Self {
            host: PathBuf::from(props.get_or(DOTNET_HOST_PROP, "dotnet")),
        }
    }

    pub fn sys_path(home: &Path) -> PathBuf {
        home.join("lib").join("dotnet").join("sys.dll")
    }

    pub fn command(&self, request: &LaunchRequest) -> Command {
        let mut cmd = Command::new(&self.host);
        cmd.arg(Self::sys_path(&request.home))
            .arg(&request.entry_point)
            .args(&request.args)
            .env("FAN_HOME", &request.home);
        cmd
    }
}

impl RuntimeBackend for DotnetBackend {
    fn runtime(&self) -> Runtime {
        Runtime::Dotnet
    }

    fn launch(&self, request: &LaunchRequest) -> LaunchResult<i32> {
        debug!("launch dotnet");
        debug!("  sys.dll = {}", Self::sys_path(&request.home).display());
        debug!("  entry point = {}", request.entry_point);
        let status = self.command(request).status().map_err(|e| {
            LaunchError::Backend(format!("Could not run {}: {}", request.entry_point, e))
        })?;
        exit_code(&self.host, status)
    }
}
