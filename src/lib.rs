//! # Command line interface for bamshard
//! [bamshard command line interface, subcommands, and options.](cli::Commands)
//! # README for bamshard
#![doc = include_str!("../README.md")]
/// Split sam/bam/cram files into bam shards.
pub mod bamsplit;
/// Command line interface for bamshard.
pub mod cli;
/// Error types.
pub mod error;
/// Functions for fastx files.
pub mod fastx;
/// Module for automatically writing compressed or uncompressed files.
pub mod myio;
/// Resolve how many shards to write and how large they should be.
pub mod plan;
/// Open, hold, and close one output per shard.
pub mod pool;
/// Traits connecting record sources and sinks to the splitter.
pub mod record;
/// The streaming shard assignment.
pub mod shard;
