use crate::error::Result;
use rust_htslib::bam;

/// Records that belong to a read group identified by a key.
/// Consecutive records with equal keys are never split across shards.
pub trait GroupKey {
    fn group_key(&self) -> &[u8];
}

impl GroupKey for bam::Record {
    fn group_key(&self) -> &[u8] {
        self.qname()
    }
}

impl GroupKey for String {
    fn group_key(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl GroupKey for &str {
    fn group_key(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// An output that accepts records in order and is closed once at the end.
pub trait RecordSink {
    type Record;

    fn write_record(&mut self, record: &Self::Record) -> Result<()>;

    /// Flush and finalize the output.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// In memory sink, handy for checking where records landed.
impl<R: Clone> RecordSink for Vec<R> {
    type Record = R;

    fn write_record(&mut self, record: &R) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}
