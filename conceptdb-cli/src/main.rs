//! `conceptdb`: build belief graphs, propagate confidence, inspect scores.

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use conceptdb_core::config::Strategy;
use conceptdb_core::ConceptDbConfig;

use commands::{GraphSource, PropagateArgs};

#[derive(Parser)]
#[command(name = "conceptdb")]
#[command(about = "Justification and confidence propagation for ConceptDB")]
struct Cli {
    /// TOML config file; missing sections use defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `conceptdb_propagation=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every strategy over the built-in example graph
    Demo,

    /// Export the reason store as a graph file
    BuildGraph {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Give every reason record its own node
        #[arg(long)]
        reason_nodes: bool,
        /// Drop reasons whose endpoints have at most this many records
        #[arg(long, default_value_t = 0)]
        min_degree: usize,
    },

    /// Score every node relative to a root
    Propagate(PropagateCommand),

    /// Print the confidence of one id
    Confidence {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        id: String,
        /// Estimate from the reasons targeting the id instead of reading the stored value
        #[arg(long)]
        local: bool,
    },
}

#[derive(Args)]
#[command(group(clap::ArgGroup::new("source").required(true).args(["graph", "db"])))]
struct PropagateCommand {
    /// Graph file to read
    #[arg(long)]
    graph: Option<PathBuf>,
    /// Database to build the graph from
    #[arg(long)]
    db: Option<PathBuf>,
    #[arg(long)]
    root: String,
    /// electrical, corona or spreading; defaults to the configured one
    #[arg(long)]
    strategy: Option<Strategy>,
    /// Store the clamped scores as confidences
    #[arg(long, requires = "db", conflicts_with = "graph")]
    write_back: bool,
    /// Print the whole outcome as JSON
    #[arg(long)]
    json: bool,
    /// Only list the highest N scores
    #[arg(long)]
    top: Option<usize>,
}

impl PropagateCommand {
    fn into_args(self) -> Result<PropagateArgs> {
        let source = match (self.graph, self.db) {
            (_, Some(db)) => GraphSource::Store(db),
            (Some(graph), None) => GraphSource::File(graph),
            (None, None) => bail!("one of --graph or --db is required"),
        };
        Ok(PropagateArgs {
            source,
            root: self.root,
            strategy: self.strategy,
            write_back: self.write_back,
            json: self.json,
            top: self.top,
        })
    }
}

fn load_config(cli: &Cli) -> Result<ConceptDbConfig> {
    let mut config = match &cli.config {
        Some(path) => ConceptDbConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConceptDbConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    logging::init_tracing(&config.observability);
    debug!(?config, "configuration loaded");

    let output = match cli.command {
        Command::Demo => commands::demo(&config)?,
        Command::BuildGraph {
            db,
            out,
            reason_nodes,
            min_degree,
        } => commands::build_graph(&config, &db, &out, reason_nodes, min_degree)?,
        Command::Propagate(cmd) => commands::propagate(&config, &cmd.into_args()?)?,
        Command::Confidence { db, id, local } => commands::confidence(&config, &db, &id, local)?,
    };
    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn propagate_needs_a_source() {
        assert!(Cli::try_parse_from(["conceptdb", "propagate", "--root", "r"]).is_err());
        assert!(Cli::try_parse_from([
            "conceptdb", "propagate", "--graph", "g", "--root", "r", "--write-back",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "conceptdb", "propagate", "--db", "x.db", "--root", "r", "--strategy", "corona",
        ])
        .unwrap();
        match cli.command {
            Command::Propagate(cmd) => {
                let args = cmd.into_args().unwrap();
                assert!(matches!(args.source, GraphSource::Store(_)));
                assert_eq!(args.strategy, Some(Strategy::Corona));
            }
            _ => panic!("expected propagate"),
        }
    }

    #[test]
    fn log_level_flag_overrides_config() {
        let cli = Cli::try_parse_from(["conceptdb", "--log-level", "debug", "demo"]).unwrap();
        assert_eq!(load_config(&cli).unwrap().observability.log_level, "debug");
    }
}
