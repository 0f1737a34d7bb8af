use crate::error::{Error, Result};
use crate::plan::SplitOpts;
use crate::pool::{shard_paths, ShardPool};
use crate::record::RecordSink;
use crate::shard::{split_records, SplitSummary};
use lazy_static::lazy_static;
use regex::Regex;
use rust_htslib::bam::{self, Read};
use rust_htslib::tpool::ThreadPool;
use std::path::Path;

lazy_static! {
    static ref SORT_ORDER_RE: Regex = Regex::new(r"(?m)^@HD\t.*\bSO:([^\s]+)").unwrap();
}

impl RecordSink for bam::Writer {
    type Record = bam::Record;

    fn write_record(&mut self, record: &bam::Record) -> Result<()> {
        self.write(record)?;
        Ok(())
    }

    /// htslib flushes and writes the EOF block when the writer is dropped.
    fn close(self) -> Result<()> {
        drop(self);
        Ok(())
    }
}

/// The `SO` value of the `@HD` line, if there is one.
/// # Example
/// ```
/// use bamshard::bamsplit::sort_order;
/// assert_eq!(sort_order("@HD\tVN:1.6\tSO:queryname\n"), Some("queryname"));
/// assert_eq!(sort_order("@SQ\tSN:chr1\tLN:10\n"), None);
/// ```
pub fn sort_order(header_text: &str) -> Option<&str> {
    SORT_ORDER_RE
        .captures(header_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Warn when the header says the reads of a template are probably not adjacent.
pub fn warn_on_sort_order(header: &bam::HeaderView) {
    let text = String::from_utf8_lossy(header.as_bytes());
    match sort_order(&text) {
        Some("coordinate") => log::warn!(
            "Splitting a coordinate sorted bam may result in invalid bams \
            that do not always contain each read's mate in the same bam."
        ),
        Some(order) => log::debug!("Input sort order: {}", order),
        None => log::debug!("Input has no sort order in the @HD line."),
    }
}

/// Copy the input header and add a PG line for this program.
pub fn output_header(header: &bam::HeaderView) -> bam::Header {
    let mut header = bam::Header::from_template(header);
    let mut pg_line = bam::header::HeaderRecord::new(b"PG");
    pg_line.push_tag(b"ID", env!("CARGO_PKG_NAME"));
    pg_line.push_tag(b"PN", env!("CARGO_PKG_NAME"));
    pg_line.push_tag(b"VN", env!("CARGO_PKG_VERSION"));
    let full_cmd = std::env::args()
        .map(|arg| arg.replace(' ', "\\ "))
        .collect::<Vec<String>>()
        .join(" ");
    pg_line.push_tag(b"CL", full_cmd);
    header.push_record(&pg_line);
    header
}

fn open_writer(
    path: &Path,
    header: &bam::Header,
    tpool: &ThreadPool,
    uncompressed: bool,
) -> Result<bam::Writer> {
    let mut writer =
        bam::Writer::from_path(path, header, bam::Format::Bam).map_err(|e| Error::OpenShard {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    writer.set_thread_pool(tpool)?;
    if uncompressed {
        writer.set_compression_level(bam::CompressionLevel::Uncompressed)?;
    }
    Ok(writer)
}

/// Split a query grouped sam/bam/cram into bam shards.
///
/// Mates and other records that share a read name stay in the same shard, and
/// concatenating the shards in order gives back the input order.
pub fn run_split_bam(opts: &SplitOpts) -> Result<SplitSummary> {
    let plan = opts.validate()?;

    let tpool = ThreadPool::new(opts.threads.max(1) as u32)?;
    let mut reader = if opts.input == "-" {
        bam::Reader::from_stdin()?
    } else {
        bam::Reader::from_path(&opts.input)?
    };
    reader.set_thread_pool(&tpool)?;
    warn_on_sort_order(reader.header());
    let header = output_header(reader.header());

    let paths = shard_paths(&opts.output, &opts.prefix, "bam", &plan);
    let mut pool = ShardPool::open(paths, |path| {
        open_writer(path, &header, &tpool, opts.uncompressed)
    })?;
    log::info!(
        "Opened {} shards in {}",
        pool.len(),
        opts.output.display()
    );

    let records = reader.records().map(|rec| rec.map_err(Error::from));
    let summary = split_records(records, pool.sinks_mut(), &plan)?;
    pool.finish()?;
    Ok(summary)
}
