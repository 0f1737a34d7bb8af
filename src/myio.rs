use crate::error::{Error, Result};
use flate2::write;
use flate2::Compression;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufWriter, IntoInnerError, Write};
use std::path::Path;

/// A plain or gzipped output file.
///
/// `finish` must be called to write the gzip trailer and see any error from
/// the final flush; dropping the writer swallows those errors.
pub enum Output {
    Plain(BufWriter<File>),
    Gzip(BufWriter<write::GzEncoder<File>>),
}

impl Output {
    pub fn from_file(file: File, gzip: bool) -> Output {
        if gzip {
            Output::Gzip(BufWriter::with_capacity(
                128 * 1024,
                write::GzEncoder::new(file, Compression::default()),
            ))
        } else {
            Output::Plain(BufWriter::with_capacity(128 * 1024, file))
        }
    }

    /// Flush the buffer and, for gzip, write the final block and trailer.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Output::Plain(out) => {
                out.into_inner().map_err(IntoInnerError::into_error)?;
            }
            Output::Gzip(out) => {
                let encoder = out.into_inner().map_err(IntoInnerError::into_error)?;
                encoder.finish()?;
            }
        }
        Ok(())
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Plain(out) => out.write(buf),
            Output::Gzip(out) => out.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Plain(out) => out.flush(),
            Output::Gzip(out) => out.flush(),
        }
    }
}

/// Write normal or compressed files seamlessly
/// Uses the presence of a `.gz` extension to decide
pub fn writer(path: &Path) -> Result<Output> {
    let file = File::create(path).map_err(|why| Error::OpenShard {
        path: path.to_path_buf(),
        reason: why.to_string(),
    })?;
    Ok(Output::from_file(
        file,
        path.extension() == Some(OsStr::new("gz")),
    ))
}

/// Make sure the input can be opened; `-` (stdin) is always accepted.
pub fn check_readable(input: &str) -> Result<()> {
    if input == "-" {
        return Ok(());
    }
    let path = Path::new(input);
    let unreadable = |reason: String| Error::UnreadableInput {
        path: path.to_path_buf(),
        reason,
    };
    let meta = fs::metadata(path).map_err(|why| unreadable(why.to_string()))?;
    if meta.is_dir() {
        return Err(unreadable("is a directory".to_string()));
    }
    File::open(path).map_err(|why| unreadable(why.to_string()))?;
    Ok(())
}

/// Make sure the output directory exists and is not read only.
pub fn check_writable_dir(dir: &Path) -> Result<()> {
    let unwritable = |reason: String| Error::UnwritableOutput {
        path: dir.to_path_buf(),
        reason,
    };
    let meta = fs::metadata(dir).map_err(|why| unwritable(why.to_string()))?;
    if !meta.is_dir() {
        return Err(unwritable("not a directory".to_string()));
    }
    if meta.permissions().readonly() {
        return Err(unwritable("directory is read only".to_string()));
    }
    Ok(())
}
