use anyhow::Context;
use bamshard::cli::{Commands, PlanArgs};
use bamshard::plan::{resolve_plan, shard_file_name, SplitOpts};
use bamshard::shard::SplitSummary;
use bamshard::*;
use colored::Colorize;
use env_logger::{Builder, Target};
use itertools::Itertools;
use log::LevelFilter;
use std::path::Path;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    parse_cli()
}

fn split_opts(input: &str, output: &Path, prefix: &str, plan: &PlanArgs, threads: usize) -> SplitOpts {
    SplitOpts {
        input: input.to_string(),
        output: output.to_path_buf(),
        prefix: prefix.to_string(),
        total: plan.total_reads,
        n_reads: plan.n_reads,
        n_files: plan.n_files,
        threads,
        uncompressed: false,
        extension: None,
    }
}

fn report(summary: &SplitSummary) {
    log::info!(
        "Wrote {} reads across {} shards.",
        summary.observed,
        summary.per_shard.len()
    );
    log::debug!("Reads per shard: {}", summary.per_shard.iter().join(", "));
    if summary.overflow > 0 {
        log::warn!(
            "{} reads beyond the declared total were written to the last shard.",
            summary.overflow
        );
    }
}

pub fn parse_cli() -> anyhow::Result<()> {
    let pg_start = Instant::now();
    let args = cli::make_cli_parse();

    // set the logging level
    let min_log_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    Builder::new()
        .target(Target::Stderr)
        .filter(None, min_log_level)
        .init();

    log::debug!("DEBUG logging enabled");
    log::trace!("TRACE logging enabled");

    let subcommand = match &args.command {
        Some(command) => command.name(),
        None => return Ok(()),
    };

    match &args.command {
        //
        // Run Split
        //
        Some(Commands::Split {
            input,
            output,
            prefix,
            plan,
            uncompressed,
        }) => {
            let mut opts = split_opts(input, output, prefix, plan, args.threads);
            opts.uncompressed = *uncompressed;
            let summary = bamsplit::run_split_bam(&opts)
                .with_context(|| format!("Failed to split {}", input))?;
            report(&summary);
        }
        //
        // Run FastxSplit
        //
        Some(Commands::FastxSplit {
            input,
            output,
            prefix,
            plan,
            extension,
        }) => {
            let mut opts = split_opts(input, output, prefix, plan, args.threads);
            opts.extension = extension.clone();
            let summary = fastx::run_split_fastx(&opts)
                .with_context(|| format!("Failed to split {}", input))?;
            report(&summary);
        }
        //
        // Run Plan
        //
        Some(Commands::Plan {
            plan,
            prefix,
            extension,
        }) => {
            let plan = resolve_plan(plan.total_reads, plan.n_files, plan.n_reads)?;
            println!("#file\ttarget_reads");
            for idx in 0..plan.shard_count {
                println!(
                    "{}\t{}",
                    shard_file_name(prefix, idx, plan.shard_count, extension),
                    plan.target_per_shard
                );
            }
        }
        //
        // no command opt
        //
        None => {}
    };

    let duration = pg_start.elapsed();
    log::info!(
        "{} done! Time elapsed: {}",
        subcommand.bright_green().bold(),
        format!("{:.2?}", duration).bright_yellow().bold()
    );
    Ok(())
}
