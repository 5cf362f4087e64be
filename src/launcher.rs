// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! # Launcher Pipeline
//!
//! One pass per process:
//!
//! 1. load `{home}/etc/sys/config.props` (a missing or malformed file is
//!    only a warning)
//! 2. split the arguments, applying `--Dname=value` overrides
//! 3. select the runtime and, for `fan`, apply `runtime.substitutes`
//! 4. hand off to the selected [`RuntimeBackend`]
//!
//! Every stage returns a [`LaunchResult`]; the first fatal error stops the
//! sequence and the process exits with [`EXIT_FAILURE`].

use std::{
    env,
    ffi::OsString,
    io::Write,
    path::{Path, PathBuf},
};

use env_logger::Builder;
use log::{debug, error, warn, Level, LevelFilter};
use serde::Serialize;

use crate::{
    args::{self, VERBOSE_FLAG},
    backend::{self, LaunchRequest, RuntimeBackend},
    error::{LaunchError, LaunchResult},
    overlay::{ConfigOverlay, EnvOverrides},
    props::Props,
    runtime::{Runtime, RuntimeSelector, Tool},
};

/// Launcher version reported in verbose mode
pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit code for any failure before hand-off
pub const EXIT_FAILURE: i32 = -1;

/// Location of the config file relative to the Fan home
pub fn config_path(home: &Path) -> PathBuf {
    home.join("etc").join("sys").join("config.props")
}

/// Inputs fixed for one launcher invocation
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub tool: Tool,
    /// Argument always placed first in the forwarded vector
    pub main_arg: Option<String>,
    pub home: PathBuf,
    pub cwd: PathBuf,
    pub env: EnvOverrides,
}

impl LaunchOptions {
    /// Options for a launcher binary at `exe`, two levels below the Fan home
    /// (`{home}/bin/fan`).
    pub fn from_exe(exe: &Path, env: EnvOverrides) -> LaunchResult<Self> {
        let home = exe
            .parent()
            .and_then(Path::parent)
            .ok_or_else(|| LaunchError::HomeNotFound(exe.display().to_string()))?
            .to_path_buf();
        Ok(Self {
            tool: Tool::from_exe_path(exe).unwrap_or(Tool::Fan),
            main_arg: None,
            home,
            cwd: env::current_dir()?,
            env,
        })
    }
}

/// Resolved launch decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub tool: Tool,
    pub runtime: Runtime,
    pub home: PathBuf,
    pub entry_point: String,
    pub args: Vec<String>,
    pub verbose: bool,
    /// Effective properties after command-line overrides
    #[serde(skip)]
    pub props: Props,
}

impl LaunchPlan {
    pub fn request(&self) -> LaunchRequest {
        LaunchRequest {
            home: self.home.clone(),
            args: self.args.clone(),
            entry_point: self.entry_point.clone(),
        }
    }
}

/// Whether verbose diagnostics are requested for this invocation
pub fn is_verbose<S: AsRef<str>>(env: &EnvOverrides, raw_args: &[S]) -> bool {
    env.debug || raw_args.iter().any(|a| a.as_ref() == VERBOSE_FLAG)
}

/// Install the launcher's logger: `-- ` debug lines when verbose, otherwise
/// only prefixed warnings and errors.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let _ = Builder::new()
        .format(|buf, record| match record.level() {
            Level::Error => writeln!(buf, "ERROR: {}", record.args()),
            Level::Warn => writeln!(buf, "WARN: {}", record.args()),
            _ => writeln!(buf, "-- {}", record.args()),
        })
        .filter(None, level)
        .try_init();
}

/// Read config.props under `home`. A missing file or a syntax error yields
/// an empty store; no entry of a malformed file is kept.
pub fn load_config(home: &Path) -> Props {
    let path = config_path(home);
    match Props::load(&path) {
        Ok(props) => props,
        Err(e) if e.is_not_found() => {
            warn!("Cannot read config.props: \"{}\"", path.display());
            Props::new()
        }
        Err(e) => {
            warn!("Cannot read config.props: {}", e);
            Props::new()
        }
    }
}

/// Convert process arguments to strings, rejecting any that are not Unicode.
pub fn unicode_args<I>(args: I) -> LaunchResult<Vec<String>>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|bad| LaunchError::InvalidArgument(bad.to_string_lossy().into_owned()))
        })
        .collect()
}

/// Run config loading, argument splitting and runtime selection.
pub fn prepare<S: AsRef<str>>(
    options: &LaunchOptions,
    raw_args: &[S],
) -> LaunchResult<LaunchPlan> {
    debug!("launcher version {}", LAUNCHER_VERSION);
    for (i, arg) in raw_args.iter().enumerate() {
        debug!("  args[{}] = \"{}\"", i, arg.as_ref());
    }
    debug!("init");
    debug!("  home = {}", options.home.display());

    let mut props = load_config(&options.home);
    debug!("  config.props:");
    for prop in &props {
        debug!("    {}={}", prop.name, prop.value);
    }

    let split = args::split_args(raw_args, options.main_arg.as_deref(), &mut props);

    let selector = RuntimeSelector::new(options.tool, &options.cwd);
    let selection = {
        let overlay =
            ConfigOverlay::new(&props, &options.env, split.runtime_override.as_deref());
        selector.select(&overlay, &options.home, &split.forwarded)?
    };

    Ok(LaunchPlan {
        tool: options.tool,
        runtime: selection.runtime,
        home: selection.home,
        entry_point: options.tool.entry_point(selection.runtime),
        args: split.forwarded,
        verbose: is_verbose(&options.env, raw_args),
        props,
    })
}

/// Hand the plan to `backend`, returning the runtime's exit code.
pub fn launch(plan: &LaunchPlan, backend: &dyn RuntimeBackend) -> LaunchResult<i32> {
    if backend.runtime() != plan.runtime {
        return Err(LaunchError::Backend(format!(
            "internal error: {} backend selected for {} runtime",
            backend.runtime(),
            plan.runtime
        )));
    }
    backend.launch(&plan.request())
}

/// Complete launcher sequence for the current process; returns the exit code.
pub fn run() -> i32 {
    let raw_args: Vec<OsString> = env::args_os().skip(1).collect();
    let env = EnvOverrides::from_process();
    init_logging(env.debug || raw_args.iter().any(|a| a == VERBOSE_FLAG));

    let result = unicode_args(raw_args).and_then(|raw_args| {
        let exe = env::current_exe()?;
        let options = LaunchOptions::from_exe(&exe, env)?;
        let plan = prepare(&options, &raw_args)?;
        let backend = backend::for_runtime(plan.runtime, &plan.props);
        launch(&plan, backend.as_ref())
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            EXIT_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockRuntimeBackend;
    use std::fs;
    use tempfile::TempDir;

    fn home_with_config(config: Option<&str>) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        if let Some(text) = config {
            let path = config_path(dir.path());
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }
        dir
    }

    fn options(tool: Tool, home: &Path) -> LaunchOptions {
        LaunchOptions {
            tool,
            main_arg: None,
            home: home.to_path_buf(),
            cwd: PathBuf::from("/work"),
            env: EnvOverrides::default(),
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let home = home_with_config(None);
        let plan = prepare(&options(Tool::Fan, home.path()), &["hello.fan"]).unwrap();
        assert_eq!(plan.runtime, Runtime::Java);
        assert_eq!(plan.home, home.path());
        assert_eq!(plan.entry_point, "fanx.tools.Fan");
        assert_eq!(plan.args, vec!["hello.fan"]);
        assert!(plan.props.is_empty());
    }

    #[test]
    fn test_config_selects_dotnet() {
        let home = home_with_config(Some("runtime=dotnet\n"));
        let plan = prepare(&options(Tool::Fant, home.path()), &["sys"]).unwrap();
        assert_eq!(plan.runtime, Runtime::Dotnet);
        assert_eq!(plan.entry_point, "Fanx.Tools.Fant");
    }

    #[test]
    fn test_cmd_line_override_beats_env_and_file() {
        let home = home_with_config(Some("runtime=java\n"));
        let mut opts = options(Tool::Fan, home.path());
        opts.env.runtime = Some("java".to_string());
        let plan = prepare(&opts, &["--Druntime=dotnet", "a.fan"]).unwrap();
        assert_eq!(plan.runtime, Runtime::Dotnet);
        assert_eq!(plan.args, vec!["a.fan"]);
        assert_eq!(plan.props.get("runtime"), Some("dotnet"));
    }

    #[test]
    fn test_syntax_error_drops_whole_config() {
        let home = home_with_config(Some("runtime=dotnet\nbroken\n"));
        assert!(load_config(home.path()).is_empty());

        let plan = prepare(&options(Tool::Fan, home.path()), &["a.fan"]).unwrap();
        assert_eq!(plan.runtime, Runtime::Java);
        assert!(plan.props.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unicode_args_rejects_invalid_bytes() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![OsString::from("a.fan"), OsString::from_vec(b"caf\xe9.fan".to_vec())];
        let err = unicode_args(args).unwrap_err();
        assert!(matches!(err, LaunchError::InvalidArgument(ref a) if a == "caf\u{FFFD}.fan"));
    }

    #[test]
    fn test_unicode_args_keeps_order() {
        let args = vec![OsString::from("--v"), OsString::from("x")];
        assert_eq!(unicode_args(args).unwrap(), vec!["--v", "x"]);
    }

    #[test]
    fn test_unknown_runtime_never_reaches_backend() {
        let home = home_with_config(Some("runtime=bogus\n"));
        let result = prepare(&options(Tool::Fan, home.path()), &["a.fan"]);
        assert!(matches!(result, Err(LaunchError::UnknownRuntime(_))));
    }

    #[test]
    fn test_verbose_flag_detected() {
        let home = home_with_config(None);
        let plan = prepare(&options(Tool::Fan, home.path()), &["--v", "a.fan"]).unwrap();
        assert!(plan.verbose);
        assert_eq!(plan.args, vec!["a.fan"]);
    }

    #[test]
    fn test_main_arg_leads_forwarded_args() {
        let home = home_with_config(None);
        let mut opts = options(Tool::Fan, home.path());
        opts.main_arg = Some("compilerJava".to_string());
        let plan = prepare(&opts, &["x"]).unwrap();
        assert_eq!(plan.args, vec!["compilerJava", "x"]);
    }

    #[test]
    fn test_launch_hands_request_to_backend() {
        let home = home_with_config(Some("runtime=dotnet\n"));
        let plan = prepare(&options(Tool::Fan, home.path()), &["a.fan", "1"]).unwrap();
        let expected = plan.request();

        let mut backend = MockRuntimeBackend::new();
        backend.expect_runtime().return_const(Runtime::Dotnet);
        backend
            .expect_launch()
            .withf(move |req| *req == expected)
            .times(1)
            .returning(|_| Ok(3));

        assert_eq!(launch(&plan, &backend).unwrap(), 3);
    }

    #[test]
    fn test_launch_rejects_mismatched_backend() {
        let home = home_with_config(None);
        let plan = prepare(&options(Tool::Fan, home.path()), &["a.fan"]).unwrap();

        let mut backend = MockRuntimeBackend::new();
        backend.expect_runtime().return_const(Runtime::Dotnet);
        backend.expect_launch().never();

        assert!(launch(&plan, &backend).is_err());
    }

    #[test]
    fn test_options_from_exe() {
        let opts =
            LaunchOptions::from_exe(Path::new("/opt/fan/bin/fant"), EnvOverrides::default())
                .unwrap();
        assert_eq!(opts.home, PathBuf::from("/opt/fan"));
        assert_eq!(opts.tool, Tool::Fant);

        let opts =
            LaunchOptions::from_exe(Path::new("/opt/fan/bin/launcher"), EnvOverrides::default())
                .unwrap();
        assert_eq!(opts.tool, Tool::Fan);
    }

    #[test]
    fn test_is_verbose() {
        let env = EnvOverrides {
            debug: true,
            runtime: None,
        };
        assert!(is_verbose(&env, &[] as &[&str]));
        assert!(is_verbose(&EnvOverrides::default(), &["x", "--v"]));
        assert!(!is_verbose(&EnvOverrides::default(), &["-v"]));
    }
}
