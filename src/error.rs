use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while planning, opening, or streaming a split.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot set the total number of reads to a number less than 1, found {0}")]
    InvalidTotal(u64),
    #[error("one of --n-files or --n-reads must be given")]
    MissingSplitTarget,
    #[error("only one of --n-files ({n_files}) or --n-reads ({n_reads}) may be given")]
    ConflictingSplitTarget { n_files: u64, n_reads: u64 },
    #[error("--{name} must be greater than 1, found {value}")]
    SplitTargetTooSmall { name: &'static str, value: u64 },
    #[error("cannot split into zero shards")]
    NoShards,
    #[error("input {} is not readable: {reason}", .path.display())]
    UnreadableInput { path: PathBuf, reason: String },
    #[error("output directory {} is not writable: {reason}", .path.display())]
    UnwritableOutput { path: PathBuf, reason: String },
    #[error("failed to open shard {}: {reason}", .path.display())]
    OpenShard { path: PathBuf, reason: String },
    #[error("failed to read record number {index}: {reason}")]
    ReadRecord { index: u64, reason: String },
    #[error("failed to write record number {index} to shard {shard}: {reason}")]
    WriteRecord {
        index: u64,
        shard: usize,
        reason: String,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Htslib(#[from] rust_htslib::errors::Error),
    #[error(transparent)]
    Fastx(#[from] needletail::errors::ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
