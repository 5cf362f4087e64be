// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! # Runtime Substitutes
//!
//! The `runtime.substitutes` property maps individual script files to an
//! alternate Fan home directory, so a "boot build" of the runtime can be
//! driven by another installed runtime. The value is a whitespace separated
//! list of `<scriptUri> = <runtimeUri>` triples, for example:
//!
//! ```text
//! runtime.substitutes=/C:/dev/fan/src/buildall.fan = C:/dev/rel
//! ```
//!
//! Script URIs are absolute paths with forward slashes and a leading slash.
//! Matching is ASCII case-insensitive and the first match wins.

use std::path::{Component, Path};

use log::debug;
use thiserror::Error;

/// Property holding the substitution triples
pub const SUBSTITUTES_PROP: &str = "runtime.substitutes";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionError {
    #[error("Invalid format for sys prop \"runtime.substitutes\": expected '=' but found '{found}'")]
    MissingEquals { found: String },
}

/// Iterate the `(scriptUri, runtimeUri)` pairs of a substitutes value.
///
/// A triple whose middle token is not `=` yields an error; callers stop
/// there. Trailing tokens that do not form a full triple are ignored.
pub fn entries<'a>(
    value: &'a str,
) -> impl Iterator<Item = Result<(&'a str, &'a str), SubstitutionError>> + 'a {
    let mut tokens = value.split_whitespace();
    std::iter::from_fn(move || {
        let script = tokens.next()?;
        let eq = tokens.next()?;
        let runtime = tokens.next()?;
        if eq != "=" {
            return Some(Err(SubstitutionError::MissingEquals {
                found: eq.to_string(),
            }));
        }
        Some(Ok((script, runtime)))
    })
}

/// Find the runtime home mapped to `target_uri`.
///
/// Scanning stops at the first match or at the first malformed triple; in the
/// latter case the error is returned and no substitution applies.
pub fn find_substitute<'a>(
    value: &'a str,
    target_uri: &str,
) -> Result<Option<&'a str>, SubstitutionError> {
    for entry in entries(value) {
        let (script, runtime) = entry?;
        debug!("    {} = {}", script, runtime);
        if script.eq_ignore_ascii_case(target_uri) {
            return Ok(Some(runtime));
        }
    }
    Ok(None)
}

/// Resolve `target` against `cwd` and render it as a Fan file URI path:
/// forward slashes, a single leading slash, `.` and `..` folded away.
pub fn script_uri(target: &str, cwd: &Path) -> String {
    let path = Path::new(target);
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut prefix = String::new();
    let mut segments: Vec<String> = Vec::new();
    for component in full.components() {
        match component {
            Component::Prefix(p) => prefix = p.as_os_str().to_string_lossy().into_owned(),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                segments.pop();
            }
            Component::Normal(s) => segments.push(s.to_string_lossy().into_owned()),
        }
    }

    let mut uri = String::from("/");
    if !prefix.is_empty() {
        uri.push_str(&prefix.replace('\\', "/"));
        uri.push('/');
    }
    uri.push_str(&segments.join("/"));
    uri
}
