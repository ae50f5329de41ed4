//! entmap CLI
//!
//! Checks and inspects entity mapping projects written as TOML or JSON.
//!
//! ## Usage
//!
//! ```bash
//! entmap check project.toml
//! entmap hierarchy project.toml
//! entmap inspect project.toml --json
//! entmap -vv --settings entmap.toml check project.json
//! ```

mod report;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use colored::Colorize;
use entmap_conf::MetadataSettings;
use entmap_metadata::hierarchy::InheritanceHierarchyBuilder;
use entmap_metadata::processor::{MappedProject, MetadataProcessor};
use entmap_metadata::project::MetadataProject;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "entmap")]
#[command(about = "Entity mapping metadata utility", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbosity: u8,

	/// Settings file; `ENTMAP_*` environment variables override its values
	#[arg(long, value_name = "FILE", global = true)]
	settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
	/// Process a project and report the first error
	Check {
		/// Project file (.toml or .json)
		#[arg(value_name = "PROJECT")]
		project: PathBuf,
	},

	/// Print the inheritance hierarchy of a project
	Hierarchy {
		/// Project file (.toml or .json)
		#[arg(value_name = "PROJECT")]
		project: PathBuf,
	},

	/// Print the resolved keys and mappings of a project
	Inspect {
		/// Project file (.toml or .json)
		#[arg(value_name = "PROJECT")]
		project: PathBuf,

		/// Print the processed project as JSON
		#[arg(long)]
		json: bool,
	},
}

fn main() {
	let cli = Cli::parse();

	let result = load_settings(cli.settings.as_deref()).and_then(|settings| {
		init_tracing(&settings, cli.verbosity);
		match cli.command {
			Commands::Check { project } => run_check(&project, settings),
			Commands::Hierarchy { project } => run_hierarchy(&project),
			Commands::Inspect { project, json } => run_inspect(&project, settings, json),
		}
	});

	if let Err(e) = result {
		eprintln!("{} {:#}", "Error:".red().bold(), e);
		process::exit(1);
	}
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<MetadataSettings> {
	let settings = MetadataSettings::load(path).context("failed to load settings")?;
	Ok(settings)
}

/// `RUST_LOG` wins; otherwise each `-v` raises the configured level one step
fn init_tracing(settings: &MetadataSettings, verbosity: u8) {
	let level = match verbosity {
		0 => settings.log_level.as_str(),
		1 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.try_init();
}

fn load_project(path: &Path) -> anyhow::Result<MetadataProject> {
	let project = MetadataProject::from_path(path)
		.with_context(|| format!("failed to load project {}", path.display()))?;
	tracing::debug!(path = %path.display(), entities = project.len(), "project loaded");
	Ok(project)
}

fn process(path: &Path, settings: MetadataSettings) -> anyhow::Result<MappedProject> {
	let project = load_project(path)?;
	let mapped = MetadataProcessor::new(settings)
		.process(project)
		.with_context(|| format!("failed to process project {}", path.display()))?;
	Ok(mapped)
}

fn run_check(path: &Path, settings: MetadataSettings) -> anyhow::Result<()> {
	let mapped = process(path, settings)?;
	let relationships: usize = mapped
		.descriptors()
		.map(|descriptor| descriptor.mappings().count())
		.sum();

	println!(
		"{} {} entities, {} relationships",
		"✓".green().bold(),
		mapped.len(),
		relationships
	);
	Ok(())
}

fn run_hierarchy(path: &Path) -> anyhow::Result<()> {
	let project = load_project(path)?;
	let hierarchy_tree = InheritanceHierarchyBuilder::build(project.descriptors());

	if let Err(error) = hierarchy_tree.validate_acyclic() {
		eprintln!("{} {}", "Warning:".yellow().bold(), error);
	}
	print!("{}", report::render_hierarchy(&hierarchy_tree));
	Ok(())
}

fn run_inspect(path: &Path, settings: MetadataSettings, json: bool) -> anyhow::Result<()> {
	let mapped = process(path, settings)?;

	if json {
		let rendered =
			serde_json::to_string_pretty(&mapped).context("failed to serialize project")?;
		println!("{}", rendered);
	} else {
		print!("{}", report::render_project(&mapped));
	}
	Ok(())
}
