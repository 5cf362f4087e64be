// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! # fanprops - Command Line Interface
//!
//! Operator tool over the launcher core: validate and inspect `config.props`
//! files and preview which runtime, home directory and arguments a launcher
//! invocation would use, without starting any runtime.

use std::{
    env,
    io::Write,
    path::PathBuf,
};

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use env_logger::Builder;
use log::{debug, info, LevelFilter};
use prettytable::{format, Cell, Row, Table};

use crate::{
    error::{LaunchError, LaunchResult},
    launcher::{self, LaunchOptions, LaunchPlan},
    overlay::EnvOverrides,
    props::Props,
    runtime::Tool,
};

/// fanprops - Fan launcher configuration inspector
#[derive(Parser, Debug)]
#[command(name = "fanprops")]
#[command(version)]
#[command(about = "Inspect config.props files and preview launcher decisions", long_about = None)]
struct Cli {
    /// Sets the level of verbosity (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a props file and report syntax errors
    Check(FileArgs),

    /// List every entry of a props file in file order
    Dump(FileArgs),

    /// Print the value of one property
    Get(GetArgs),

    /// Show the launch plan for a tool without starting a runtime
    Resolve(ResolveArgs),
}

/// Arguments naming a props file
#[derive(Args, Debug)]
struct FileArgs {
    /// Path to the props file
    file: PathBuf,
}

/// Arguments for property lookup
#[derive(Args, Debug)]
struct GetArgs {
    /// Path to the props file
    file: PathBuf,

    /// Property name
    name: String,

    /// Value printed when the property is missing
    #[arg(short, long)]
    default: Option<String>,
}

/// Arguments for launch plan resolution
#[derive(Args, Debug)]
struct ResolveArgs {
    /// Fan home directory
    #[arg(long)]
    home: PathBuf,

    /// Launcher tool (fan, fant, fanp, jstub, nstub)
    #[arg(short, long, default_value = "fan")]
    tool: Tool,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,

    /// Launcher arguments, as they would follow the tool name
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Main entry point for the CLI
pub fn run() -> LaunchResult<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Warn,
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter(None, log_level)
        .init();

    info!("fanprops starting");

    match cli.command {
        Commands::Check(args) => handle_check(args),
        Commands::Dump(args) => handle_dump(args),
        Commands::Get(args) => handle_get(args),
        Commands::Resolve(args) => handle_resolve(args),
    }
}

/// Handle check command
fn handle_check(args: FileArgs) -> LaunchResult<()> {
    match Props::load(&args.file) {
        Ok(props) => {
            println!("{} ({} entries)", "OK".green().bold(), props.len());
            Ok(())
        }
        Err(e) => {
            // details go to stderr with the returned error
            println!("{}", "FAILED".red().bold());
            Err(e.into())
        }
    }
}

/// Handle dump command
fn handle_dump(args: FileArgs) -> LaunchResult<()> {
    let props = Props::load(&args.file)?;

    if props.is_empty() {
        println!("No properties found");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(vec![Cell::new("Name"), Cell::new("Value")]));

    for prop in &props {
        table.add_row(Row::new(vec![
            Cell::new(&prop.name),
            Cell::new(&prop.value.escape_debug().to_string()),
        ]));
    }

    table.printstd();
    Ok(())
}

/// Handle get command
fn handle_get(args: GetArgs) -> LaunchResult<()> {
    let props = Props::load(&args.file)?;

    match props.get(&args.name).or(args.default.as_deref()) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => Err(LaunchError::MissingProperty(format!(
            "{} [{}]",
            args.name,
            args.file.display()
        ))),
    }
}

/// Handle resolve command
fn handle_resolve(args: ResolveArgs) -> LaunchResult<()> {
    let options = LaunchOptions {
        tool: args.tool,
        main_arg: None,
        home: args.home,
        cwd: env::current_dir()?,
        env: EnvOverrides::from_process(),
    };
    debug!("resolving with {:?}", options);

    let plan = launcher::prepare(&options, &args.args)?;

    if args.json {
        let json = serde_json::to_string_pretty(&plan)?;
        println!("{}", json);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &LaunchPlan) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

    table.add_row(Row::new(vec![Cell::new("Tool"), Cell::new(plan.tool.name())]));
    table.add_row(Row::new(vec![
        Cell::new("Runtime"),
        Cell::new(&plan.runtime.to_string()),
    ]));
    table.add_row(Row::new(vec![
        Cell::new("Home"),
        Cell::new(&plan.home.display().to_string()),
    ]));
    table.add_row(Row::new(vec![
        Cell::new("Entry point"),
        Cell::new(&plan.entry_point),
    ]));
    for (i, arg) in plan.args.iter().enumerate() {
        table.add_row(Row::new(vec![Cell::new(&format!("Arg [{}]", i)), Cell::new(arg)]));
    }

    table.printstd();
}
