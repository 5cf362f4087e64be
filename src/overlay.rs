// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! Effective configuration: config.props entries layered under the process
//! environment and the command line.

use std::env;

use crate::props::Props;

/// Property naming the runtime backend
pub const RUNTIME_PROP: &str = "runtime";

/// Environment variable that enables verbose diagnostics when present
pub const DEBUG_ENV: &str = "fan_launcher_debug";

/// Environment variable overriding the `runtime` property
pub const RUNTIME_ENV: &str = "fan_runtime";

/// Snapshot of the environment variables the launcher reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub debug: bool,
    pub runtime: Option<String>,
}

impl EnvOverrides {
    pub fn from_process() -> Self {
        Self {
            debug: env::var_os(DEBUG_ENV).is_some(),
            runtime: env::var(RUNTIME_ENV).ok(),
        }
    }
}

/// Read-only layered view used for runtime selection.
///
/// `--Dname=value` overrides already live in `props`; only the `runtime`
/// name also consults the environment and the command-line directive, in
/// increasing order of precedence.
#[derive(Debug, Clone, Copy)]
pub struct ConfigOverlay<'a> {
    props: &'a Props,
    env: &'a EnvOverrides,
    cmd_line_runtime: Option<&'a str>,
}

impl<'a> ConfigOverlay<'a> {
    pub fn new(props: &'a Props, env: &'a EnvOverrides, cmd_line_runtime: Option<&'a str>) -> Self {
        Self {
            props,
            env,
            cmd_line_runtime,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&'a str> {
        if name == RUNTIME_PROP {
            if let Some(rt) = self.cmd_line_runtime {
                return Some(rt);
            }
            if let Some(rt) = self.env.runtime.as_deref() {
                return Some(rt);
            }
        }
        self.props.get(name)
    }

    pub fn lookup_or(&self, name: &str, default: &'a str) -> &'a str {
        self.lookup(name).unwrap_or(default)
    }

    pub fn props(&self) -> &'a Props {
        self.props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(source: &str) -> Props {
        Props::parse_str(source, "test").unwrap()
    }

    #[test]
    fn test_falls_back_to_props_then_default() {
        let p = props("runtime=dotnet\nother=1");
        let env = EnvOverrides::default();
        let overlay = ConfigOverlay::new(&p, &env, None);
        assert_eq!(overlay.lookup("runtime"), Some("dotnet"));
        assert_eq!(overlay.lookup("other"), Some("1"));
        assert_eq!(overlay.lookup_or("missing", "java"), "java");
    }

    #[test]
    fn test_env_beats_props() {
        let p = props("runtime=dotnet");
        let env = EnvOverrides {
            debug: false,
            runtime: Some("java".to_string()),
        };
        let overlay = ConfigOverlay::new(&p, &env, None);
        assert_eq!(overlay.lookup("runtime"), Some("java"));
    }

    #[test]
    fn test_cmd_line_beats_env() {
        let p = props("runtime=java");
        let env = EnvOverrides {
            debug: false,
            runtime: Some("java".to_string()),
        };
        let overlay = ConfigOverlay::new(&p, &env, Some("dotnet"));
        assert_eq!(overlay.lookup("runtime"), Some("dotnet"));
    }

    #[test]
    fn test_env_only_applies_to_runtime() {
        let p = props("java.options=-Xmx1G");
        let env = EnvOverrides {
            debug: true,
            runtime: Some("dotnet".to_string()),
        };
        let overlay = ConfigOverlay::new(&p, &env, Some("dotnet"));
        assert_eq!(overlay.lookup("java.options"), Some("-Xmx1G"));
        assert_eq!(overlay.lookup("runtime.substitutes"), None);
    }
}
