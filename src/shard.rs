use crate::error::{Error, Result};
use crate::plan::SplitPlan;
use crate::record::{GroupKey, RecordSink};
use num_format::{Locale, ToFormattedString};
use std::fmt;
use std::time::Instant;

/// How often a progress line is logged.
pub const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Decides which shard each record goes to.
///
/// The cursor moves to the next shard only once the current shard holds at
/// least `target` records *and* the incoming key differs from the previous
/// one, so a run of records with the same key always stays together even if
/// that overshoots the target. If the last shard is full and a new group
/// starts, the cursor stays on the last shard (clamps) rather than running
/// off the end; this only happens when the input holds more records than
/// were declared.
#[derive(Debug)]
pub struct ShardCursor {
    target: u64,
    shard_count: usize,
    shard: usize,
    written: u64,
    previous: Option<Vec<u8>>,
    clamped: bool,
    overflow: u64,
}

impl ShardCursor {
    pub fn new(target: u64, shard_count: usize) -> ShardCursor {
        ShardCursor {
            target,
            shard_count,
            shard: 0,
            written: 0,
            previous: None,
            clamped: false,
            overflow: 0,
        }
    }

    /// Returns the zero-based shard index for the record with `key`.
    /// # Example
    /// ```
    /// use bamshard::shard::ShardCursor;
    /// let mut cursor = ShardCursor::new(2, 3);
    /// let shards: Vec<usize> = ["a", "a", "a", "b", "b", "c"]
    ///     .iter()
    ///     .map(|k| cursor.assign(k.as_bytes()))
    ///     .collect();
    /// assert_eq!(shards, vec![0, 0, 0, 1, 1, 2]);
    /// ```
    pub fn assign(&mut self, key: &[u8]) -> usize {
        let new_group = self.previous.as_deref() != Some(key);
        if self.written >= self.target && new_group {
            if self.shard + 1 < self.shard_count {
                self.shard += 1;
                self.written = 0;
            } else if !self.clamped {
                log::warn!(
                    "The last shard already holds {} reads; writing the remaining reads to it. \
                    The input likely has more reads than were declared.",
                    self.written
                );
                self.clamped = true;
            }
        }
        if self.clamped {
            self.overflow += 1;
        }

        match self.previous.as_mut() {
            Some(prev) => {
                prev.clear();
                prev.extend_from_slice(key);
            }
            None => self.previous = Some(key.to_vec()),
        }
        self.written += 1;
        self.shard
    }

    pub fn shard(&self) -> usize {
        self.shard
    }

    /// Records written to the last shard after it was clamped.
    pub fn overflow(&self) -> u64 {
        self.overflow
    }
}

/// The declared and observed read totals did not agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMismatch {
    pub declared: u64,
    pub observed: u64,
}

impl fmt::Display for CountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "The total reads provided ({}) does not match the reads found in the input ({}).",
            self.declared.to_formatted_string(&Locale::en),
            self.observed.to_formatted_string(&Locale::en)
        )
    }
}

/// What happened during a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    pub declared: u64,
    pub observed: u64,
    pub per_shard: Vec<u64>,
    pub overflow: u64,
}

impl SplitSummary {
    pub fn count_mismatch(&self) -> Option<CountMismatch> {
        if self.declared == self.observed {
            None
        } else {
            Some(CountMismatch {
                declared: self.declared,
                observed: self.observed,
            })
        }
    }
}

/// Stream `records` into `sinks` following `plan`.
///
/// Reads one record at a time and writes it before reading the next. The
/// sinks are not closed here; the caller owns them and closes them on both
/// the success and error paths.
pub fn split_records<R, I, K>(records: I, sinks: &mut [K], plan: &SplitPlan) -> Result<SplitSummary>
where
    R: GroupKey,
    I: IntoIterator<Item = Result<R>>,
    K: RecordSink<Record = R>,
{
    if sinks.is_empty() {
        return Err(Error::NoShards);
    }
    if sinks.len() != plan.shard_count {
        log::warn!(
            "The plan calls for {} shards but {} outputs are open.",
            plan.shard_count,
            sinks.len()
        );
    }
    let start = Instant::now();
    let mut cursor = ShardCursor::new(plan.target_per_shard, sinks.len());
    let mut per_shard = vec![0_u64; sinks.len()];
    let mut observed = 0_u64;

    for record in records {
        let index = observed + 1;
        let record = record.map_err(|e| Error::ReadRecord {
            index,
            reason: e.to_string(),
        })?;
        let shard = cursor.assign(record.group_key());
        sinks[shard]
            .write_record(&record)
            .map_err(|e| Error::WriteRecord {
                index,
                shard: shard + 1,
                reason: e.to_string(),
            })?;
        per_shard[shard] += 1;
        observed = index;

        if observed % PROGRESS_INTERVAL == 0 {
            log::info!(
                "Processed {} reads, writing shard {} of {}. Elapsed: {:.2?}",
                observed.to_formatted_string(&Locale::en),
                shard + 1,
                sinks.len(),
                start.elapsed()
            );
        }
    }

    let summary = SplitSummary {
        declared: plan.total,
        observed,
        per_shard,
        overflow: cursor.overflow(),
    };
    if let Some(mismatch) = summary.count_mismatch() {
        log::warn!("{}", mismatch);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::resolve_plan;
    use itertools::Itertools;

    fn run(keys: &[&'static str], plan: &SplitPlan) -> (Vec<Vec<&'static str>>, SplitSummary) {
        let mut sinks: Vec<Vec<&str>> = vec![Vec::new(); plan.shard_count];
        let records = keys.iter().map(|k| Ok::<_, Error>(*k));
        let summary = split_records(records, &mut sinks, plan).unwrap();
        (sinks, summary)
    }

    fn paired_keys() -> Vec<&'static str> {
        // mate pairs with a few reads that have extra supplementary records
        vec![
            "r1", "r1", "r2", "r2", "r3", "r3", "r3", "r4", "r4", "r5", "r5", "r6", "r6", "r6",
            "r6", "r7", "r7", "r8", "r8", "r9", "r9",
        ]
    }

    #[test]
    fn test_order_is_preserved() {
        let keys = paired_keys();
        let plan = resolve_plan(keys.len() as u64, Some(4), None).unwrap();
        let (sinks, summary) = run(&keys, &plan);
        let concat: Vec<&str> = sinks.into_iter().flatten().collect();
        assert_eq!(concat, keys);
        assert_eq!(summary.observed, keys.len() as u64);
        assert!(summary.count_mismatch().is_none());
    }

    #[test]
    fn test_groups_are_never_split() {
        let keys = paired_keys();
        for n_files in 2..8 {
            let plan = resolve_plan(keys.len() as u64, Some(n_files), None).unwrap();
            let (sinks, _) = run(&keys, &plan);
            for key in keys.iter().unique() {
                let holding = sinks.iter().filter(|s| s.contains(key)).count();
                assert_eq!(holding, 1, "{} split across shards", key);
            }
        }
    }

    #[test]
    fn test_boundary_is_deferred_within_group() {
        let plan = SplitPlan {
            total: 6,
            shard_count: 3,
            target_per_shard: 2,
        };
        let (sinks, summary) = run(&["a", "a", "a", "b", "b", "c"], &plan);
        assert_eq!(sinks, vec![vec!["a", "a", "a"], vec!["b", "b"], vec!["c"]]);
        assert_eq!(summary.per_shard, vec![3, 2, 1]);
        assert_eq!(summary.overflow, 0);
    }

    #[test]
    fn test_shards_meet_target_until_last() {
        let keys: Vec<&str> = (0..100).map(|_| "x").collect();
        let unique: Vec<String> = (0..100).map(|i| format!("read{}", i)).collect();
        let unique: Vec<&str> = unique.iter().map(|s| s.as_str()).collect();
        let plan = resolve_plan(100, None, Some(30)).unwrap();
        let mut sinks: Vec<Vec<&str>> = vec![Vec::new(); plan.shard_count];
        let summary =
            split_records(unique.iter().map(|k| Ok(*k)), &mut sinks, &plan).unwrap();
        assert_eq!(summary.per_shard, vec![25, 25, 25, 25]);

        // a single giant group can not be split at all
        let (sinks, _) = run(&keys, &plan);
        assert_eq!(sinks[0].len(), 100);
        assert!(sinks[1..].iter().all(|s| s.is_empty()));
    }

    #[test]
    fn test_count_mismatch_is_not_fatal() {
        let names: Vec<String> = (0..99).map(|i| format!("q{}", i / 2)).collect();
        let plan = resolve_plan(100, Some(4), None).unwrap();
        let mut sinks: Vec<Vec<String>> = vec![Vec::new(); plan.shard_count];
        let summary =
            split_records(names.iter().cloned().map(Ok), &mut sinks, &plan).unwrap();
        assert_eq!(
            summary.count_mismatch(),
            Some(CountMismatch {
                declared: 100,
                observed: 99
            })
        );
        let concat: Vec<String> = sinks.into_iter().flatten().collect();
        assert_eq!(concat, names);
    }

    #[test]
    fn test_extra_reads_clamp_to_last_shard() {
        let plan = SplitPlan {
            total: 4,
            shard_count: 2,
            target_per_shard: 2,
        };
        let (sinks, summary) = run(&["a", "b", "c", "d", "e", "f", "f"], &plan);
        assert_eq!(sinks[0], vec!["a", "b"]);
        assert_eq!(sinks[1], vec!["c", "d", "e", "f", "f"]);
        assert_eq!(summary.overflow, 3);
        assert_eq!(summary.per_shard, vec![2, 5]);
    }

    /// Keeps records until it sees `fail_on`.
    struct FailingSink {
        records: Vec<&'static str>,
        fail_on: &'static str,
    }

    impl RecordSink for FailingSink {
        type Record = &'static str;

        fn write_record(&mut self, record: &&'static str) -> Result<()> {
            if *record == self.fail_on {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "No space left on device",
                )));
            }
            self.records.push(*record);
            Ok(())
        }

        fn close(self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_errors_stop_the_split() {
        let keys = paired_keys();
        let plan = resolve_plan(keys.len() as u64, Some(3), None).unwrap();
        let mut sinks: Vec<FailingSink> = (0..3)
            .map(|_| FailingSink {
                records: Vec::new(),
                fail_on: "r5",
            })
            .collect();
        let records = keys.iter().map(|k| Ok(*k));
        let err = split_records(records, &mut sinks, &plan).unwrap_err();
        // r5 is the tenth record and the first of the second shard
        assert!(matches!(err, Error::WriteRecord { index: 10, shard: 2, .. }));
        let written: Vec<&str> = sinks.iter().flat_map(|s| s.records.clone()).collect();
        assert_eq!(written, keys[..9].to_vec());
    }

    #[test]
    fn test_no_shards_is_an_error() {
        let plan = resolve_plan(2, Some(2), None).unwrap();
        let mut sinks: Vec<Vec<&str>> = Vec::new();
        let records = vec![Ok("a"), Ok("b")];
        assert!(matches!(
            split_records(records, &mut sinks, &plan),
            Err(Error::NoShards)
        ));
    }

    #[test]
    fn test_read_errors_stop_the_split() {
        let plan = resolve_plan(4, Some(2), None).unwrap();
        let mut sinks: Vec<Vec<&str>> = vec![Vec::new(); 2];
        let records = vec![
            Ok("a"),
            Ok("b"),
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "truncated",
            ))),
            Ok("d"),
        ];
        let err = split_records(records, &mut sinks, &plan).unwrap_err();
        assert!(matches!(err, Error::ReadRecord { index: 3, .. }));
        assert_eq!(sinks.concat(), vec!["a", "b"]);
    }
}
