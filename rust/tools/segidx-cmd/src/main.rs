use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "segidx-cmd")]
#[command(about = "Command-line utility for segment offset index operations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic segment description (JSON list of framed batches)
    Generate {
        /// Number of batches in the segment
        #[arg(long, default_value_t = 1000)]
        batches: usize,

        /// Maximal number of records per batch
        #[arg(long, default_value_t = 100)]
        records: i32,

        /// Make every K-th batch a configuration batch
        #[arg(long)]
        non_data_every: Option<usize>,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output file for the segment description
        #[arg(short, long)]
        output: String,
    },

    /// Scan a segment description and write its offset index
    Build {
        /// Segment description produced by `generate`
        #[arg(long)]
        segment: String,

        /// JSON file with the indexing configuration
        #[arg(long)]
        config: Option<String>,

        /// Number of non-data records preceding the segment
        #[arg(long, default_value_t = 0)]
        initial_delta: i64,

        /// Output file for the serialized index
        #[arg(short, long)]
        output: String,

        /// Output file for the scan statistics (JSON)
        #[arg(long)]
        stats: Option<String>,
    },

    /// Inspect a serialized index and display summary information
    Inspect {
        /// List the index entries
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Path of the serialized index
        index_path: String,
    },

    /// Find the last index entry below an offset
    #[command(group(ArgGroup::new("bound").required(true).args(["primary", "logical"])))]
    Find {
        /// Search by primary offset
        #[arg(long)]
        primary: Option<i64>,

        /// Search by logical offset
        #[arg(long)]
        logical: Option<i64>,

        /// Path of the serialized index
        index_path: String,
    },

    /// Print the coarse logical offset to byte position map of an index
    Coarse {
        /// Minimal distance in bytes between coarse entries
        #[arg(long, default_value_t = segidx_segment::config::DEFAULT_COARSE_STEP)]
        step: u64,

        /// Path of the serialized index
        index_path: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            batches,
            records,
            non_data_every,
            seed,
            output,
        } => commands::generate::run(batches, records, non_data_every, seed, output),
        Commands::Build {
            segment,
            config,
            initial_delta,
            output,
            stats,
        } => commands::build::run(segment, config, initial_delta, output, stats),
        Commands::Inspect {
            verbose,
            index_path,
        } => commands::inspect::run(verbose, index_path),
        Commands::Find {
            primary,
            logical,
            index_path,
        } => commands::find::run(primary, logical, index_path),
        Commands::Coarse { step, index_path } => commands::coarse::run(step, index_path),
    }
}
