use crate::error::{Error, Result};
use crate::myio;
use std::fmt;
use std::path::PathBuf;

/// The resolved number of shards and the number of records each should hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan {
    pub total: u64,
    pub shard_count: usize,
    pub target_per_shard: u64,
}

impl fmt::Display for SplitPlan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} shards of ~{} records ({} declared)",
            self.shard_count, self.target_per_shard, self.total
        )
    }
}

/// Everything a split subcommand needs to know.
#[derive(Debug, Clone)]
pub struct SplitOpts {
    /// Input file, `-` for stdin.
    pub input: String,
    /// Directory the shards are written to.
    pub output: PathBuf,
    /// Shards are named `<prefix>_<N>.<ext>`.
    pub prefix: String,
    pub total: u64,
    pub n_reads: Option<u64>,
    pub n_files: Option<u64>,
    pub threads: usize,
    /// Bam output only.
    pub uncompressed: bool,
    /// Fastx output only: shard extension instead of one derived from the input.
    pub extension: Option<String>,
}

impl SplitOpts {
    /// Resolve the plan, then check the input and output locations.
    /// Nothing is opened for writing here.
    pub fn validate(&self) -> Result<SplitPlan> {
        let plan = resolve_plan(self.total, self.n_files, self.n_reads)?;
        myio::check_readable(&self.input)?;
        myio::check_writable_dir(&self.output)?;
        log::info!("Split plan: {}", plan);
        Ok(plan)
    }
}

/// `num` must be at least 1.
fn ceil_div(num: u64, den: u64) -> u64 {
    (num - 1) / den + 1
}

/// Resolve the split plan from the declared total and exactly one of
/// a shard count (`n_files`) or a records-per-shard target (`n_reads`).
///
/// When `n_reads` drives the plan the per-shard target is rebalanced
/// across the resulting shards so the last shard is not nearly empty.
/// # Example
/// ```
/// use bamshard::plan::resolve_plan;
/// let plan = resolve_plan(100, None, Some(30)).unwrap();
/// assert_eq!(plan.shard_count, 4);
/// assert_eq!(plan.target_per_shard, 25);
/// ```
pub fn resolve_plan(total: u64, n_files: Option<u64>, n_reads: Option<u64>) -> Result<SplitPlan> {
    if total < 1 {
        return Err(Error::InvalidTotal(total));
    }
    let shard_count = match (n_files, n_reads) {
        (None, None) => return Err(Error::MissingSplitTarget),
        (Some(n_files), Some(n_reads)) => {
            return Err(Error::ConflictingSplitTarget { n_files, n_reads })
        }
        (Some(n_files), None) => {
            if n_files <= 1 {
                return Err(Error::SplitTargetTooSmall {
                    name: "n-files",
                    value: n_files,
                });
            }
            n_files
        }
        (None, Some(n_reads)) => {
            if n_reads <= 1 {
                return Err(Error::SplitTargetTooSmall {
                    name: "n-reads",
                    value: n_reads,
                });
            }
            ceil_div(total, n_reads)
        }
    };
    let target_per_shard = ceil_div(total, shard_count);
    if shard_count > total {
        log::warn!(
            "Splitting {} reads into {} files will leave {} files empty.",
            total,
            shard_count,
            shard_count - total
        );
    }
    Ok(SplitPlan {
        total,
        shard_count: shard_count as usize,
        target_per_shard,
    })
}

/// Number of digits used for the numeric suffix of the shard files.
/// # Example
/// ```
/// use bamshard::plan::suffix_width;
/// assert_eq!(suffix_width(9), 1);
/// assert_eq!(suffix_width(48), 2);
/// assert_eq!(suffix_width(150), 3);
/// ```
pub fn suffix_width(shard_count: usize) -> usize {
    shard_count.to_string().len()
}

/// Name of the shard at zero-based `index`, numbered from 1 in the file name.
/// # Example
/// ```
/// use bamshard::plan::shard_file_name;
/// assert_eq!(shard_file_name("shard", 0, 48, "bam"), "shard_01.bam");
/// assert_eq!(shard_file_name("reads", 149, 150, "fq.gz"), "reads_150.fq.gz");
/// ```
pub fn shard_file_name(prefix: &str, index: usize, shard_count: usize, ext: &str) -> String {
    format!(
        "{}_{:0width$}.{}",
        prefix,
        index + 1,
        ext,
        width = suffix_width(shard_count)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_from_n_reads_is_rebalanced() {
        let plan = resolve_plan(800_000_000, None, Some(48_000_000)).unwrap();
        assert_eq!(plan.shard_count, 17);
        assert_eq!(plan.target_per_shard, 47_058_824);
    }

    #[test]
    fn test_plan_from_n_files() {
        let plan = resolve_plan(100, Some(3), None).unwrap();
        assert_eq!(plan.shard_count, 3);
        assert_eq!(plan.target_per_shard, 34);
        let plan = resolve_plan(96, Some(48), None).unwrap();
        assert_eq!(plan.target_per_shard, 2);
    }

    #[test]
    fn test_huge_totals_do_not_overflow() {
        let plan = resolve_plan(u64::MAX, Some(2), None).unwrap();
        assert_eq!(plan.target_per_shard, u64::MAX / 2 + 1);
        let plan = resolve_plan(u64::MAX, None, Some(u64::MAX - 1)).unwrap();
        assert_eq!(plan.shard_count, 2);
        assert_eq!(plan.target_per_shard, u64::MAX / 2 + 1);
    }

    #[test]
    fn test_more_files_than_reads() {
        let plan = resolve_plan(3, Some(5), None).unwrap();
        assert_eq!(plan.shard_count, 5);
        assert_eq!(plan.target_per_shard, 1);
    }

    #[test]
    fn test_invalid_plans() {
        assert!(matches!(
            resolve_plan(0, Some(4), None),
            Err(Error::InvalidTotal(0))
        ));
        assert!(matches!(
            resolve_plan(100, None, None),
            Err(Error::MissingSplitTarget)
        ));
        assert!(matches!(
            resolve_plan(100, Some(4), Some(10)),
            Err(Error::ConflictingSplitTarget { .. })
        ));
        assert!(matches!(
            resolve_plan(100, Some(1), None),
            Err(Error::SplitTargetTooSmall { name: "n-files", .. })
        ));
        assert!(matches!(
            resolve_plan(100, None, Some(0)),
            Err(Error::SplitTargetTooSmall { name: "n-reads", .. })
        ));
    }

    #[test]
    fn test_plan_is_checked_before_paths() {
        let opts = SplitOpts {
            input: "does/not/exist.bam".to_string(),
            output: PathBuf::from("does/not/exist"),
            prefix: "shard".to_string(),
            total: 0,
            n_reads: Some(10),
            n_files: None,
            threads: 1,
            uncompressed: false,
            extension: None,
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidTotal(0))));
        let opts = SplitOpts { total: 100, ..opts };
        assert!(matches!(
            opts.validate(),
            Err(Error::UnreadableInput { .. })
        ));
    }

    #[test]
    fn test_names_are_padded_to_shard_count() {
        let names: Vec<String> = (0..10)
            .map(|i| shard_file_name("shard", i, 10, "bam"))
            .collect();
        assert_eq!(names[0], "shard_01.bam");
        assert_eq!(names[9], "shard_10.bam");
        assert_eq!(shard_file_name("x", 0, 150, "bam"), "x_001.bam");
    }
}
