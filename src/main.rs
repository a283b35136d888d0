use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use treesight::Result;
use treesight::commands::{clear, index_paths, list_indexed, search, write_config};
use treesight::config::{Config, show_config};

#[derive(Parser)]
#[command(name = "treesight")]
#[command(about = "Semantic search over directory trees with per-directory embedding caches")]
#[command(version)]
struct Cli {
    /// Increase log detail (-v info, -vv debug); overrides the configured verbosity
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed files under the given paths and write their index caches
    Index {
        /// Files or directories to index, defaults to the current directory
        paths: Vec<PathBuf>,
        /// Re-embed files even when their cache entry is current
        #[arg(short, long)]
        force: bool,
        /// Chunk width in bytes
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Maximum number of chunks embedded per file
        #[arg(long)]
        max_chunks: Option<usize>,
    },
    /// Find the chunks most similar to a query
    Search {
        query: String,
        /// Directories whose caches are searched, defaults to the current directory
        #[arg(short, long, num_args = 1..)]
        paths: Vec<PathBuf>,
        /// Number of results
        #[arg(short = 'n', long, default_value_t = 5)]
        limit: usize,
        /// Print the stored vector of each result
        #[arg(long)]
        vectors: bool,
    },
    /// List files with cached embeddings
    Indexed {
        paths: Vec<PathBuf>,
    },
    /// Delete index caches under the given paths
    Clear {
        paths: Vec<PathBuf>,
    },
    /// Write the configuration file, or print it with --show
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.index.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_default()?;
    if cli.verbose > 0 {
        config.index.verbosity = cli.verbose;
    }
    init_tracing(&config);

    match cli.command {
        Commands::Index {
            paths,
            force,
            chunk_size,
            max_chunks,
        } => {
            index_paths(&config, &paths, force, chunk_size, max_chunks)?;
        }
        Commands::Search {
            query,
            paths,
            limit,
            vectors,
        } => {
            search(&config, &query, &paths, limit, vectors)?;
        }
        Commands::Indexed { paths } => {
            list_indexed(&config, &paths)?;
        }
        Commands::Clear { paths } => {
            clear(&config, &paths)?;
        }
        Commands::Config { show } => {
            if show {
                show_config(&config)?;
            } else {
                write_config(&config)?;
            }
        }
    }

    Ok(())
}
