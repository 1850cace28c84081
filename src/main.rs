//! diststage CLI
//!
//! Entry point for the `diststage` command-line tool.

use clap::{Parser, Subcommand};
use diststage::archive::Duplicate;
use diststage::config::FileConfig;
use diststage::descriptor::{self, Descriptor};
use diststage::resolver::LocalRepository;
use diststage::{archive, merge, sources, stage, Action};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "diststage")]
#[command(about = "Stage, package, and describe project distributions", version)]
struct Cli {
    /// Path to config file (default: diststage.toml, optional)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Path to the project descriptor
    #[arg(long, short = 'd', global = true, default_value = "project.toml")]
    descriptor: PathBuf,

    /// Root of the local artifact repository
    #[arg(long, short = 'r', global = true, default_value = "repository")]
    repository: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy or unpack the project's dependencies into a stage directory
    Stage {
        /// Override the stage directory from config
        #[arg(long)]
        stage_dir: Option<PathBuf>,

        /// Output the report in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Unpack the sources counterpart of each surviving dependency
    Sources {
        /// Override the output directory from config
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Output the unpacked coordinates in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Package the configured file sets into a zip archive
    Zip {
        /// Override the archive base name from config
        #[arg(long)]
        final_name: Option<String>,

        /// Override the output directory from config
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Duplicate entry policy: add, preserve, or fail
        #[arg(long)]
        duplicate: Option<Duplicate>,
    },

    /// Regenerate the project descriptor with overrides applied
    Generate {
        /// Override the output directory from config
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Merge text files, keeping comment lines from the first only
    Merge {
        /// Input files; overrides the config list when given
        inputs: Vec<PathBuf>,

        /// Override the output file from config
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let layer = fmt::layer().compact();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(layer).with(filter).init();

    let config = match FileConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Stage { stage_dir, json } => {
            run_stage(config, &cli.descriptor, &cli.repository, stage_dir, json);
        }
        Commands::Sources { output_dir, json } => {
            run_sources(config, &cli.descriptor, &cli.repository, output_dir, json);
        }
        Commands::Zip {
            final_name,
            output_dir,
            duplicate,
        } => {
            run_zip(config, &cli.descriptor, final_name, output_dir, duplicate);
        }
        Commands::Generate { output_dir } => {
            run_generate(config, &cli.descriptor, output_dir);
        }
        Commands::Merge { inputs, output } => {
            run_merge(config, inputs, output);
        }
    }
}

fn read_project(path: &Path) -> Descriptor {
    match Descriptor::read(path) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            eprintln!("Error reading descriptor: {}", e);
            process::exit(1);
        }
    }
}

fn run_stage(
    mut config: FileConfig,
    descriptor: &Path,
    repository: &Path,
    stage_dir: Option<PathBuf>,
    json: bool,
) {
    if let Some(dir) = stage_dir {
        config.stage.stage_dir = dir;
    }

    let project = read_project(descriptor);
    let resolver = LocalRepository::new(repository);

    let report = match stage::run(&config.stage, &project.project, &resolver) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error staging dependencies: {}", e);
            process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!(
            "Staged {} artifacts ({} copied, {} unpacked), {} skipped, {} failed",
            report.staged.len(),
            report.staged_count(Action::Copy),
            report.staged_count(Action::Unpack),
            report.skipped.len(),
            report.failed.len(),
        );
        for entry in &report.failed {
            println!("  failed: {}: {}", entry.artifact, entry.error);
        }
    }

    if !report.failed.is_empty() {
        process::exit(1);
    }
}

fn run_sources(
    mut config: FileConfig,
    descriptor: &Path,
    repository: &Path,
    output_dir: Option<PathBuf>,
    json: bool,
) {
    if let Some(dir) = output_dir {
        config.sources.output_dir = dir;
    }

    let project = read_project(descriptor);
    let resolver = LocalRepository::new(repository);

    let unpacked = match sources::run(&config.sources, &project.project, &resolver) {
        Ok(unpacked) => unpacked,
        Err(e) => {
            eprintln!("Error unpacking sources: {}", e);
            process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&unpacked) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("Unpacked sources for {} dependencies", unpacked.len());
        for coords in &unpacked {
            println!("  {}", coords);
        }
    }
}

fn run_zip(
    mut config: FileConfig,
    descriptor: &Path,
    final_name: Option<String>,
    output_dir: Option<PathBuf>,
    duplicate: Option<Duplicate>,
) {
    if let Some(name) = final_name {
        config.zip.final_name = Some(name);
    }
    if let Some(dir) = output_dir {
        config.zip.output_dir = dir;
    }
    if let Some(policy) = duplicate {
        config.zip.duplicate = policy;
    }

    // The descriptor is only needed to fall back on the project's
    // final name.
    let fallback = if config.zip.final_name.is_none() && descriptor.is_file() {
        Some(read_project(descriptor).project.final_name())
    } else {
        None
    };

    match archive::run_zip(&config.zip, fallback.as_deref()) {
        Ok(Some(path)) => println!("Created {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error creating archive: {}", e);
            process::exit(1);
        }
    }
}

fn run_generate(mut config: FileConfig, descriptor: &Path, output_dir: Option<PathBuf>) {
    config.generate.descriptor = descriptor.to_path_buf();
    if let Some(dir) = output_dir {
        config.generate.output_dir = dir;
    }

    match descriptor::regenerate(&config.generate) {
        Ok(Some(path)) => println!("Wrote {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error regenerating descriptor: {}", e);
            process::exit(1);
        }
    }
}

fn run_merge(mut config: FileConfig, inputs: Vec<PathBuf>, output: Option<PathBuf>) {
    if !inputs.is_empty() {
        config.merge.input_files = inputs;
    }
    if let Some(path) = output {
        config.merge.output_file = path;
    }

    if let Err(e) = merge::run(&config.merge) {
        eprintln!("Error merging files: {}", e);
        process::exit(1);
    }
}
