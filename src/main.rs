// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! # fan
//!
//! Native launcher for Fan tools. Install as `{home}/bin/<tool>`; the file
//! name picks the tool (`fan`, `fant`, `fanp`, `jstub`, `nstub`).

fn main() {
    std::process::exit(fan_launcher::launcher::run());
}
