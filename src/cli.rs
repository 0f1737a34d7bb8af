use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    propagate_version = true,
    subcommand_required = true,
    infer_subcommands = true,
    arg_required_else_help = true,
    help_expected = true
)]
pub struct Cli {
    /// Threads for compression and decompression.
    #[clap(short, long, default_value_t = 8)]
    pub threads: usize,

    /// Logging level [-v: Info, -vv: Debug, -vvv: Trace].
    #[clap(short, long, parse(from_occurrences), help_heading = "DEBUG")]
    pub verbose: usize,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// How to size the shards. Exactly one of `--n-reads` or `--n-files` is required.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Total number of reads in the input file.
    #[clap(short = 'T', long)]
    pub total_reads: u64,
    /// Split to have approximately N reads per output file.
    #[clap(short = 'n', long)]
    pub n_reads: Option<u64>,
    /// Split to N files.
    #[clap(short = 'N', long)]
    pub n_files: Option<u64>,
}

///
/// This structure contains all the subcommands for bamshard and their help descriptions.
///
/// Because of naming conventions for rust enums the commands names have
/// different capitalization than on the command line.
/// For example, the `FastxSplit` enum is invoked using `bamshard fastx-split`.
///
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a query grouped sam/bam/cram into multiple bam files.
    ///
    /// Each output holds approximately the same number of reads and reads that share a name (e.g. mates) are never split across outputs. Concatenating the outputs in numeric order reproduces the order of the input. Output files are named `<PREFIX>_<N>.bam`.
    #[clap(visible_aliases = &["split-bam", "sb"])]
    Split {
        /// Input sam/bam/cram file.
        #[clap(default_value = "-")]
        input: String,
        /// Directory in which to write the split bam files.
        #[clap(short, long)]
        output: PathBuf,
        /// Output files will be named <PREFIX>_<N>.bam, where N enumerates the output file.
        #[clap(short, long, default_value = "shard")]
        prefix: String,
        #[clap(flatten)]
        plan: PlanArgs,
        /// Write uncompressed bam output.
        #[clap(short, long)]
        uncompressed: bool,
    },
    /// Split a fasta or fastq file into multiple files while keeping mates together.
    ///
    /// Reads are grouped by name with any `/1` or `/2` suffix removed, so interleaved pairs stay in the same output. Outputs use the input's extension (`fa` or `fq`) and are gzipped if the input is. Input read from stdin is named `fq` unless `--extension` is given.
    #[clap(visible_aliases = &["fxs", "fq-split", "fa-split"])]
    FastxSplit {
        /// Input fasta or fastq file, optionally gzipped.
        #[clap(default_value = "-")]
        input: String,
        /// Directory in which to write the split files.
        #[clap(short, long)]
        output: PathBuf,
        /// Output files will be named <PREFIX>_<N>.<EXT>, where N enumerates the output file.
        #[clap(short, long, default_value = "shard")]
        prefix: String,
        #[clap(flatten)]
        plan: PlanArgs,
        /// Extension of the output files, e.g. `fa.gz`; add `.gz` to compress.
        #[clap(short, long)]
        extension: Option<String>,
    },
    /// Print the number of shards, their names, and the target reads per shard without reading any input.
    Plan {
        #[clap(flatten)]
        plan: PlanArgs,
        /// Prefix used to name the shards.
        #[clap(short, long, default_value = "shard")]
        prefix: String,
        /// Extension used to name the shards.
        #[clap(short, long, default_value = "bam")]
        extension: String,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Split { .. } => "split",
            Commands::FastxSplit { .. } => "fastx-split",
            Commands::Plan { .. } => "plan",
        }
    }
}

pub fn make_cli_parse() -> Cli {
    Cli::parse()
}

pub fn make_cli_app() -> clap::Command<'static> {
    Cli::command()
}
