// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! Error types shared by the launcher pipeline.

use std::io;

use thiserror::Error;

use crate::props::PropsError;

/// Fatal failures raised before control is handed to a runtime backend
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error(transparent)]
    Props(#[from] PropsError),

    #[error("Unknown runtime {0}")]
    UnknownRuntime(String),

    #[error("Invalid argument \"{0}\": not valid Unicode")]
    InvalidArgument(String),

    #[error("Cannot determine fan home: {0}")]
    HomeNotFound(String),

    #[error("Property not found: {0}")]
    MissingProperty(String),

    #[error("{0}")]
    Backend(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type LaunchResult<T> = Result<T, LaunchError>;
