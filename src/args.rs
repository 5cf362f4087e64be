// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! Separates launcher flags from the arguments forwarded to the runtime.
//!
//! Launcher flags use a `--` prefix:
//! - `--v` turns on verbose diagnostics
//! - `--Dname=value` sets a config property (and `--Druntime=...` picks the
//!   runtime with the highest precedence)
//!
//! Everything else passes through unchanged and in order.

use log::debug;

use crate::{overlay::RUNTIME_PROP, props::Props};

/// Flag enabling verbose diagnostics
pub const VERBOSE_FLAG: &str = "--v";

/// Result of splitting the raw argument list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitArgs {
    /// Arguments for the runtime entry point
    pub forwarded: Vec<String>,
    /// Value of the last `--Druntime=...`
    pub runtime_override: Option<String>,
    /// Whether `--v` was present
    pub verbose: bool,
}

/// Parse a `--Dname=value` directive into its name and value.
fn directive(arg: &str) -> Option<(&str, &str)> {
    let (name, value) = arg.strip_prefix("--D")?.split_once('=')?;
    if name.is_empty() {
        return None;
    }
    Some((name, value))
}

/// Split `args` (program name excluded), applying every `--Dname=value` to
/// `props`. `main_arg` is prepended to the forwarded vector when present.
pub fn split_args<I, S>(args: I, main_arg: Option<&str>, props: &mut Props) -> SplitArgs
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    debug!("split args");

    let mut split = SplitArgs::default();
    if let Some(main) = main_arg {
        split.forwarded.push(main.to_string());
    }

    for arg in args {
        let arg = arg.as_ref();

        if arg == VERBOSE_FLAG {
            split.verbose = true;
            continue;
        }

        if let Some((name, value)) = directive(arg) {
            props.set(name, value);
            debug!("  override prop {}={}", name, value);
            if name == RUNTIME_PROP {
                split.runtime_override = Some(value.to_string());
            }
            continue;
        }

        split.forwarded.push(arg.to_string());
    }

    debug!("  forwarded args ({})", split.forwarded.len());
    for (i, arg) in split.forwarded.iter().enumerate() {
        debug!("    [{}] {}", i, arg);
    }

    split
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_args_forwarded_in_order() {
        let mut props = Props::new();
        let split = split_args(["script.fan", "-x", "--long", "b"], None, &mut props);
        assert_eq!(split.forwarded, vec!["script.fan", "-x", "--long", "b"]);
        assert!(!split.verbose);
        assert!(props.is_empty());
    }

    #[test]
    fn test_verbose_flag_skipped() {
        let mut props = Props::new();
        let split = split_args(["a", "--v", "b"], None, &mut props);
        assert_eq!(split.forwarded, vec!["a", "b"]);
        assert!(split.verbose);
    }

    #[test]
    fn test_directive_sets_prop() {
        let mut props = Props::parse_str("java.options=-Xmx1G", "test").unwrap();
        let split = split_args(["--Djava.options=-Xmx2G", "--Dnew=1", "x"], None, &mut props);
        assert_eq!(split.forwarded, vec!["x"]);
        assert_eq!(props.get("java.options"), Some("-Xmx2G"));
        assert_eq!(props.get("new"), Some("1"));
        assert_eq!(split.runtime_override, None);
    }

    #[test]
    fn test_runtime_directive_remembered() {
        let mut props = Props::new();
        let split = split_args(["--Druntime=dotnet"], None, &mut props);
        assert_eq!(split.runtime_override.as_deref(), Some("dotnet"));
        assert_eq!(props.get("runtime"), Some("dotnet"));
        assert!(split.forwarded.is_empty());
    }

    #[test]
    fn test_directive_value_keeps_equals() {
        let mut props = Props::new();
        split_args(["--Dk=a=b"], None, &mut props);
        assert_eq!(props.get("k"), Some("a=b"));
    }

    #[test]
    fn test_directive_empty_value() {
        let mut props = Props::new();
        let split = split_args(["--Dk="], None, &mut props);
        assert_eq!(props.get("k"), Some(""));
        assert!(split.forwarded.is_empty());
    }

    #[test]
    fn test_degenerate_directives_pass_through() {
        let mut props = Props::new();
        let split = split_args(["--D", "--Dname", "--D=value", "-Dx=1", "--"], None, &mut props);
        assert_eq!(split.forwarded, vec!["--D", "--Dname", "--D=value", "-Dx=1", "--"]);
        assert!(props.is_empty());
    }

    #[test]
    fn test_main_arg_prepended() {
        let mut props = Props::new();
        let split = split_args(["a"], Some("compiler"), &mut props);
        assert_eq!(split.forwarded, vec!["compiler", "a"]);
    }
}
