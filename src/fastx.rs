use super::myio;
use crate::error::{Error, Result};
use crate::plan::SplitOpts;
use crate::pool::{shard_paths, ShardPool};
use crate::record::{GroupKey, RecordSink};
use crate::shard::{split_records, SplitSummary};
use needletail::errors::ParseErrorKind;
use needletail::parser::{write_fasta, write_fastq, FastxReader, LineEnding};
use needletail::{parse_fastx_file, parse_fastx_stdin};
use std::path::Path;

/// An owned fasta or fastq record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastxRecord {
    pub id: Vec<u8>,
    pub seq: Vec<u8>,
    pub qual: Option<Vec<u8>>,
    key_len: usize,
}

impl FastxRecord {
    pub fn new(id: &[u8], seq: &[u8], qual: Option<&[u8]>) -> FastxRecord {
        FastxRecord {
            id: id.to_vec(),
            seq: seq.to_vec(),
            qual: qual.map(|q| q.to_vec()),
            key_len: read_group_key(id).len(),
        }
    }
}

impl GroupKey for FastxRecord {
    fn group_key(&self) -> &[u8] {
        &self.id[..self.key_len]
    }
}

/// The read name that mates share: the id up to the first whitespace with
/// any `/1` or `/2` mate suffix removed.
/// # Example
/// ```
/// use bamshard::fastx::read_group_key;
/// assert_eq!(read_group_key(b"read7/1"), b"read7");
/// assert_eq!(read_group_key(b"read7/2 extra info"), b"read7");
/// assert_eq!(read_group_key(b"read7 1:N:0:ACGT"), b"read7");
/// assert_eq!(read_group_key(b"read7/3"), b"read7/3");
/// ```
pub fn read_group_key(id: &[u8]) -> &[u8] {
    let name = id
        .split(|b| b.is_ascii_whitespace())
        .next()
        .unwrap_or(id);
    match name {
        [rest @ .., b'/', b'1' | b'2'] => rest,
        _ => name,
    }
}

/// Pick the shard extension from the input name, keeping `.gz`.
///
/// Stdin and unrecognized names give `fq`; pass an explicit extension to
/// `fastx-split` for fasta on stdin. Records are always written in their own
/// format regardless of the extension.
/// # Example
/// ```
/// use bamshard::fastx::fastx_extension;
/// assert_eq!(fastx_extension("reads.fasta.gz"), "fa.gz");
/// assert_eq!(fastx_extension("reads.fastq"), "fq");
/// assert_eq!(fastx_extension("-"), "fq");
/// ```
pub fn fastx_extension(input: &str) -> String {
    let (stem, gz) = match input.strip_suffix(".gz") {
        Some(stem) => (stem, true),
        None => (input, false),
    };
    let ext = match Path::new(stem).extension().and_then(|e| e.to_str()) {
        Some("fa" | "fasta" | "fna" | "fas") => "fa",
        _ => "fq",
    };
    if gz {
        format!("{}.gz", ext)
    } else {
        ext.to_string()
    }
}

/// Iterate over owned records from a needletail reader.
/// An empty input yields no records.
pub struct FastxRecords {
    reader: Option<Box<dyn FastxReader>>,
}

impl FastxRecords {
    pub fn from_input(input: &str) -> Result<FastxRecords> {
        let parsed = if input == "-" {
            parse_fastx_stdin()
        } else {
            parse_fastx_file(input)
        };
        let reader = match parsed {
            Ok(reader) => Some(reader),
            Err(e) if matches!(e.kind, ParseErrorKind::EmptyFile) => {
                log::warn!("Input {} is empty; all shards will be empty.", input);
                None
            }
            Err(e) => return Err(e.into()),
        };
        Ok(FastxRecords { reader })
    }
}

impl Iterator for FastxRecords {
    type Item = Result<FastxRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let rec = self.reader.as_mut()?.next()?;
        Some(
            rec.map(|r| FastxRecord::new(r.id(), &r.seq(), r.qual()))
                .map_err(Error::from),
        )
    }
}

/// A fastx shard, gzipped if its name ends in `.gz`.
pub struct FastxShard {
    out: myio::Output,
}

impl FastxShard {
    pub fn create(path: &Path) -> Result<FastxShard> {
        Ok(FastxShard {
            out: myio::writer(path)?,
        })
    }
}

impl RecordSink for FastxShard {
    type Record = FastxRecord;

    fn write_record(&mut self, rec: &FastxRecord) -> Result<()> {
        match rec.qual.as_deref() {
            Some(qual) => write_fastq(
                &rec.id,
                &rec.seq,
                Some(qual),
                &mut self.out,
                LineEnding::Unix,
            )?,
            None => write_fasta(&rec.id, &rec.seq, &mut self.out, LineEnding::Unix)?,
        }
        Ok(())
    }

    fn close(self) -> Result<()> {
        self.out.finish()?;
        Ok(())
    }
}

/// Split a fasta or fastq file into shards keeping mates together.
/// ```
/// use bamshard::fastx;
/// use bamshard::plan::SplitOpts;
/// let dir = tempfile::tempdir().unwrap();
/// let input = dir.path().join("reads.fq");
/// std::fs::write(&input, "@a/1\nACGT\n+\nIIII\n@a/2\nACGT\n+\nIIII\n@b/1\nAC\n+\nII\n@b/2\nAC\n+\nII\n").unwrap();
/// let opts = SplitOpts {
///     input: input.to_str().unwrap().to_string(),
///     output: dir.path().to_path_buf(),
///     prefix: "shard".to_string(),
///     total: 4,
///     n_reads: None,
///     n_files: Some(2),
///     threads: 1,
///     uncompressed: false,
///     extension: None,
/// };
/// let summary = fastx::run_split_fastx(&opts).unwrap();
/// assert_eq!(summary.per_shard, vec![2, 2]);
/// ```
pub fn run_split_fastx(opts: &SplitOpts) -> Result<SplitSummary> {
    let plan = opts.validate()?;
    let records = FastxRecords::from_input(&opts.input)?;

    let ext = match &opts.extension {
        Some(ext) => ext.trim_start_matches('.').to_string(),
        None => fastx_extension(&opts.input),
    };
    let paths = shard_paths(&opts.output, &opts.prefix, &ext, &plan);
    let mut pool = ShardPool::open(paths, FastxShard::create)?;
    log::info!(
        "Opened {} shards in {}",
        pool.len(),
        opts.output.display()
    );

    let summary = split_records(records, pool.sinks_mut(), &plan)?;
    pool.finish()?;
    Ok(summary)
}
