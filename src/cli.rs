//! CLI interface for xorphf
//!
//! Provides command-line interface for:
//! - Generating random vector datasets
//! - Searching a variable basis and printing the best candidates
//! - Building XOR perfect-hash tables (`phf`)
//! - Building collision-free partitions (`partition`)

use crate::config::{BuildConfig, FuncSource};
use crate::driver::{build_partition, build_phf};
use crate::fitness::Fitness;
use crate::regvect::{RvMgr, VectorStore};
use crate::search::{BasisGen, BasisMethod};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xorphf")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Collision-free index functions for fixed sets of bit vectors")]
#[command(
    long_about = "xorphf - perfect hashing for known sets of fixed-width bit vectors\n\n\
    Signatures are XOR combinations of input bits. A stochastic search proposes\n\
    them and a realization step turns them into lookup structures:\n\
    • phf: d signature functions plus XOR tables (hypergraph peeling)\n\
    • partition: m signature functions plus a per-vector function choice\n\n\
    Dataset format: a \"<n> <k>\" header line, then k lines of n characters from {0,1}.\n\n\
    Examples:\n\
      xorphf gen --width 64 --count 1000 -o data.txt\n\
      xorphf basis -i data.txt -n 16 --method greedy\n\
      xorphf phf -i data.txt -o data.phf.json --degree 3 -v\n\
      xorphf partition -i data.txt -o data.part.bin -m 2 --format bincode"
)]
#[command(author = "xorphf Contributors")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Artifact encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Pretty-printed JSON
    Json,
    /// Compact bincode
    Bincode,
}

/// Options shared by the build subcommands.
#[derive(Args)]
pub struct BuildArgs {
    /// Input dataset
    #[arg(short, long, value_name = "FILE", help_heading = "Required")]
    input: PathBuf,

    /// Output artifact
    #[arg(short, long, value_name = "FILE", help_heading = "Required")]
    output: PathBuf,

    /// JSON build configuration; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where signature functions come from
    #[arg(long, value_enum)]
    source: Option<FuncSource>,

    /// Maximum number of input bits XOR-ed into one random hash output
    #[arg(long = "xor", value_name = "X")]
    xor_degree: Option<usize>,

    /// Attempts per signature width before widening
    #[arg(long, value_name = "C")]
    count_limit: Option<usize>,

    /// Artifact encoding
    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// RNG seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a dataset of distinct random vectors
    Gen {
        /// Bit width of every vector
        #[arg(long, value_name = "N")]
        width: usize,

        /// Number of vectors
        #[arg(long, value_name = "K")]
        count: usize,

        /// Output dataset
        #[arg(short, long, value_name = "FILE", help_heading = "Required")]
        output: PathBuf,

        /// RNG seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Search for the best discriminating variables
    Basis {
        /// Input dataset
        #[arg(short, long, value_name = "FILE", help_heading = "Required")]
        input: PathBuf,

        /// Number of variables to report
        #[arg(short = 'n', long, default_value_t = 16)]
        req_num: usize,

        #[arg(long, value_enum, default_value = "mcmc")]
        method: BasisMethod,

        #[arg(long, value_enum, default_value = "product")]
        fitness: Fitness,

        /// RNG seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Build XOR perfect-hash tables over d signature functions
    #[command(
        long_about = "Build XOR perfect-hash tables over d signature functions\n\n\
        Every vector becomes a hyperedge over one (function, value) node per function.\n\
        If the hypergraph peels, each node gets a table entry so that XOR-ing a vector's\n\
        d entries yields its row index. Failed attempts are retried, widening the\n\
        signature by one bit after --count-limit failures.\n\n\
        Example:\n\
          xorphf phf -i data.txt -o data.phf.json --degree 3 --xor 2 --seed 7"
    )]
    Phf {
        #[command(flatten)]
        build: BuildArgs,

        /// Number of signature functions per hyperedge
        #[arg(long, value_name = "D")]
        degree: Option<usize>,
    },

    /// Partition vectors over m signature functions without collisions
    Partition {
        #[command(flatten)]
        build: BuildArgs,

        /// Number of signature functions
        #[arg(short, long, value_name = "M")]
        multiplicity: Option<usize>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Gen {
            width,
            count,
            output,
            seed,
            verbose,
        } => {
            init_logging(verbose);
            let mut rng = make_rng(seed);
            if width < usize::BITS as usize && count > 1usize << width {
                anyhow::bail!("cannot draw {} distinct {}-bit vectors", count, width);
            }
            let store = RvMgr::random(width, count, &mut rng);
            let file = File::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            let mut writer = BufWriter::new(file);
            store.write_data(&mut writer)?;
            writer.flush()?;
            if verbose {
                println!("Wrote {} vectors of {} bits to {}", count, width, output.display());
            }
        }

        Commands::Basis {
            input,
            req_num,
            method,
            fitness,
            seed,
            verbose,
        } => {
            init_logging(verbose);
            let store = load_store(&input)?;
            let mut rng = make_rng(seed);
            let config = BuildConfig::default();
            let best = BasisGen::new(method, fitness, config.search)
                .generate(&store, req_num, &mut rng)
                .context("basis search failed")?;
            if verbose {
                println!(
                    "xorphf v{} - {} vectors of {} bits",
                    env!("CARGO_PKG_VERSION"),
                    store.len(),
                    store.vector_width()
                );
                println!("=====================================");
            }
            for (var, value) in &best {
                println!("{:.6}  {}", value, var);
            }
        }

        Commands::Phf { build, degree } => {
            init_logging(build.verbose);
            let store = load_store(&build.input)?;
            let mut config = build.config()?;
            if let Some(d) = degree {
                config.degree = d;
            }
            let mut rng = make_rng(build.seed);
            let index = build_phf(&store, &config, &mut rng).context("phf construction failed")?;
            write_artifact(&build.output, build.format, &index)?;
            if build.verbose {
                println!("PHF complete!");
                println!("  Vectors: {}", store.len());
                println!("  Functions: {} x {} bits", index.funcs.len(), index.width());
                println!("  Table entries: {}", index.table_entries());
                println!("  Output: {}", build.output.display());
            }
        }

        Commands::Partition {
            build,
            multiplicity,
        } => {
            init_logging(build.verbose);
            let store = load_store(&build.input)?;
            let mut config = build.config()?;
            if let Some(m) = multiplicity {
                config.multiplicity = m;
            }
            let mut rng = make_rng(build.seed);
            let index =
                build_partition(&store, &config, &mut rng).context("partition construction failed")?;
            write_artifact(&build.output, build.format, &index)?;
            if build.verbose {
                println!("Partition complete!");
                println!("  Vectors: {}", store.len());
                println!("  Functions: {} x {} bits", index.funcs.len(), index.width());
                println!("  Output: {}", build.output.display());
            }
        }
    }

    Ok(())
}

impl BuildArgs {
    /// Config file (or defaults) with command-line overrides applied.
    fn config(&self) -> Result<BuildConfig> {
        let mut config = match &self.config {
            Some(path) => BuildConfig::load_json(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => BuildConfig::default(),
        };
        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(x) = self.xor_degree {
            config.xor_degree = x;
        }
        if let Some(c) = self.count_limit {
            config.count_limit = c;
        }
        Ok(config)
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn load_store(path: &Path) -> Result<RvMgr> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    RvMgr::read_data(BufReader::new(file)).with_context(|| format!("reading {}", path.display()))
}

fn write_artifact<T: Serialize>(path: &Path, format: Format, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    match format {
        Format::Json => serde_json::to_writer_pretty(&mut writer, value)?,
        Format::Bincode => bincode::serialize_into(&mut writer, value)?,
    }
    writer.flush()?;
    Ok(())
}

#[cfg(feature = "logging")]
fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default = if verbose { "xorphf=debug" } else { "xorphf=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(not(feature = "logging"))]
fn init_logging(_verbose: bool) {}
