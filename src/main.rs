use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info, LevelFilter};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tadpole::modules::constants::{LABEL_OVERRIDE, ROOT_MOUNT};
use tadpole::{BindMode, Bootstrap, Config, DirBackend, Namespace};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Treat this file as the running program (defaults to this executable)
    #[arg(long, global = true)]
    exe: Option<PathBuf>,

    /// Bind a directory ahead of all detected stores (repeatable)
    #[arg(short = 'B', long = "before", global = true)]
    before: Vec<PathBuf>,

    /// Bind a directory behind all detected stores (repeatable)
    #[arg(short = 'A', long = "after", global = true)]
    after: Vec<PathBuf>,

    /// Bind the program's own directory as a last-resort fallback
    #[arg(long, global = true)]
    exe_dir: bool,

    /// Print metadata and listings as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a file's content to stdout
    Cat {
        /// Logical path
        path: String,
    },
    /// List a directory
    Ls {
        /// Logical path
        #[arg(default_value = ".")]
        path: String,
    },
    /// Show metadata for a path
    Stat {
        /// Logical path
        path: String,
    },
    /// Exit with status 0 if the path exists, 1 otherwise
    Exists {
        /// Logical path
        path: String,
    },
    /// List bound layers in precedence order
    Layers,
}

fn build_namespace(cli: &Cli) -> Result<Namespace> {
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    let bootstrap = match &cli.exe {
        Some(exe) => Bootstrap::new(exe.clone(), config.bootstrap.clone())?,
        None => Bootstrap::from_current_exe(config.bootstrap.clone())
            .context("cannot determine program location")?,
    };

    let ns = Namespace::new();
    let detection = bootstrap.detect(&ns)?;
    debug!("detection: {:?}", detection);

    if config.bind_exe_dir || cli.exe_dir {
        bootstrap.bind_exe_dir(&ns)?;
    }
    config.apply(&ns)?;

    for dir in &cli.before {
        bootstrap.bind_override(&ns, dir)?;
    }
    for dir in &cli.after {
        ns.bind(ROOT_MOUNT, DirBackend::new(dir), LABEL_OVERRIDE, BindMode::After)?;
    }
    Ok(ns)
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let ns = build_namespace(cli)?;
    let mut out = io::stdout().lock();

    match &cli.command {
        Commands::Cat { path } => {
            let mut reader = ns.open(path)?;
            io::copy(&mut reader, &mut out)?;
        }
        Commands::Ls { path } => {
            let entries = ns.read_dir(path)?;
            if cli.json {
                serde_json::to_writer_pretty(&mut out, &entries)?;
                writeln!(out)?;
            } else {
                for entry in entries {
                    if entry.is_dir() {
                        writeln!(out, "{}/", entry.name)?;
                    } else {
                        writeln!(out, "{:>10}  {}", entry.metadata.size, entry.name)?;
                    }
                }
            }
        }
        Commands::Stat { path } => {
            let meta = ns.stat(path)?;
            if cli.json {
                serde_json::to_writer_pretty(&mut out, &meta)?;
                writeln!(out)?;
            } else {
                writeln!(out, "Path: {}", path)?;
                writeln!(out, "Kind: {:?}", meta.kind)?;
                writeln!(out, "Size: {}", meta.size)?;
                if let Some(modified) = meta.modified {
                    writeln!(out, "Modified: {:?}", modified)?;
                }
            }
        }
        Commands::Exists { path } => {
            if !ns.exists(path)? {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::Layers => {
            let layers = ns.list_layers();
            if cli.json {
                serde_json::to_writer_pretty(&mut out, &layers)?;
                writeln!(out)?;
            } else {
                for layer in layers {
                    writeln!(out, "{:<12} #{:<3} {}", layer.mount_path, layer.order, layer.label)?;
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logger based on verbose flag
    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new().filter_level(log_level).init();

    info!("Starting tad...");

    run(&cli)
}
