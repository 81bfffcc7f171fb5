use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use vpa_coord::Ga;
use vpa_depgraph::DependencyGraphStore;
use vpa_engine::{Config, CveRecord, PropagationEngine};
use vpa_score::{ga_dependency_graph_from_jsons, gav_timestamps_from_csv, AffectedSubgraph, GavTimestampIndex, VpssScorer};

#[derive(Parser)]
#[command(name = "vpa", about = "Vulnerability Propagation Analysis across a package ecosystem")]
struct Cli {
	#[command(subcommand)]
	command: Command,
	/// Path to the TOML config file (repo base, dependency-store connection, tool paths, ...).
	#[arg(long, global = true, default_value = "vpa.toml")]
	config: PathBuf,
	/// Log level: off, error, warn, info, debug, trace.
	#[arg(long, global = true, default_value = "info")]
	log_level: log::LevelFilter,
}

#[derive(Subcommand)]
enum Command {
	/// Runs the Propagation Engine to fixed point for one CVE record.
	Propagate {
		#[arg(long)]
		cve: String,
		#[arg(long)]
		proc_num_deps: Option<usize>,
		#[arg(long)]
		proc_num_cg: Option<usize>,
		#[arg(long, value_enum)]
		cg_tool: Option<CgToolArg>,
	},
	/// Scores the propagation output already on disk for one CVE at one or more sample timestamps.
	Score {
		#[arg(long)]
		cve: String,
		/// Comma-separated Unix-second sample timestamps.
		#[arg(long, value_delimiter = ',')]
		timestamps: Vec<i64>,
	},
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CgToolArg {
	PointsTo,
	ReflectionAware,
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.log_level);

	match run(cli).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{e:#}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging(level: log::LevelFilter) {
	let dispatch = fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!("[{}][{}] {}", record.level(), record.target(), message))
		})
		.level(level)
		.chain(std::io::stdout());

	if let Err(e) = dispatch.apply() {
		eprintln!("logger already initialized: {e}");
	}
}

async fn run(cli: Cli) -> Result<()> {
	let config = Config::load(&cli.config)?;

	match cli.command {
		Command::Propagate { cve, proc_num_deps, proc_num_cg, cg_tool } => propagate(config, cve, proc_num_deps, proc_num_cg, cg_tool).await,
		Command::Score { cve, timestamps } => score(config, cve, timestamps),
	}
}

async fn propagate(mut config: Config, cve_id: String, proc_num_deps: Option<usize>, proc_num_cg: Option<usize>, cg_tool: Option<CgToolArg>) -> Result<()> {
	if let Some(n) = proc_num_deps {
		config.proc_num_deps = n;
	}
	if let Some(n) = proc_num_cg {
		config.proc_num_cg = n;
	}
	if let Some(tool) = cg_tool {
		config.cg_tool = match tool {
			CgToolArg::PointsTo => vpa_engine::config::CgToolChoice::PointsTo,
			CgToolArg::ReflectionAware => vpa_engine::config::CgToolChoice::ReflectionAware,
		};
	}

	let cve_path = config.working_dir.join("cves").join(format!("{cve_id}.json"));
	let cve = CveRecord::load(&cve_path).with_context(|| format!("loading CVE record for {cve_id} from {cve_path:?}"))?;

	let graph_store = DependencyGraphStore::connect(&config.depgraph_uri, &config.depgraph_user, &config.depgraph_password).await
		.context("connecting to dependency graph store")?;

	let config = Arc::new(config);
	let mut engine = PropagationEngine::new(Arc::clone(&config), Arc::new(graph_store));

	info!("propagating {cve_id} from {}", cve.vulnerable_gav);
	engine.run(&cve).await.with_context(|| format!("propagating {cve_id}"))?;
	info!("{cve_id}: worklist drained");

	Ok(())
}

fn score(config: Config, cve_id: String, timestamps: Vec<i64>) -> Result<()> {
	let cve_path = config.working_dir.join("cves").join(format!("{cve_id}.json"));
	let cve = CveRecord::load(&cve_path).with_context(|| format!("loading CVE record for {cve_id} from {cve_path:?}"))?;
	let vulnerable_gav = cve.vulnerable_gav()?;
	let root: Ga = vulnerable_gav.ga();

	let ecosystem_dir = config.ecosystem_graph_dir.as_deref().context("ecosystem_graph_dir not set in config, required for `vpa score`")?;
	let ecosystem = ga_dependency_graph_from_jsons(ecosystem_dir).with_context(|| format!("building ecosystem graph from {ecosystem_dir:?}"))?;

	let timestamp_index = match &config.gav_timestamps_csv {
		Some(path) => gav_timestamps_from_csv(path).with_context(|| format!("reading GAV timestamps from {path:?}"))?,
		None => GavTimestampIndex::new(),
	};

	let affected = AffectedSubgraph::from_working_dir(&config.working_dir, &cve_id, &vulnerable_gav)
		.with_context(|| format!("re-deriving affected subgraph for {cve_id}"))?;

	let scorer = VpssScorer::new(&ecosystem, &timestamp_index);
	for sample in timestamps {
		let vpss = scorer.score_at(&root, &affected, sample);
		println!("{cve_id}\t{sample}\t{vpss:.4}");
	}

	Ok(())
}
