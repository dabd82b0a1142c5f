/// FASTQ helpers: compressed-or-plain opening and read length sampling
use crate::error::Error;
use flate2::read::MultiGzDecoder;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Default number of FASTQ records sampled by [`estimate_read_length`].
pub const DEFAULT_READ_SAMPLE: usize = 10_000;

/// Lines per FASTQ record (header, sequence, separator, quality).
const LINES_PER_RECORD: usize = 4;
/// Offset of the sequence line within a record.
const SEQUENCE_LINE: usize = 1;

/// Mean read length over a sampled prefix of a FASTQ file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLengthEstimate {
    /// Floor of the mean sequence length
    pub length: u64,
    /// Number of records the mean was taken over (always > 0)
    pub records: u64,
}

impl fmt::Display for ReadLengthEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.length)
    }
}

/// Whether `path` names a gzip-compressed file
pub fn is_gzipped(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Open a FASTQ file, decompressing on the fly when the name ends in `.gz`
///
/// Multi-member gzip (e.g. bgzip output or concatenated archives) is read
/// through to the end.
pub fn open_reads(path: &Path) -> Result<Box<dyn BufRead + Send>, Error> {
    let file = File::open(path).map_err(|e| Error::io(e, path))?;

    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Estimate the read length from the first `max_records` FASTQ records
///
/// Every 4th line starting at line 1 is taken as a sequence line; line
/// terminators are not counted. Sampling stops after `max_records` records
/// or at end of file, and the floor of the mean length is returned.
///
/// # Errors
/// [`Error::EmptyReadSample`] when no sequence line was seen (empty file or
/// a file shorter than two lines), and [`Error::Validation`] when
/// `max_records` is zero.
pub fn estimate_read_length(path: &Path, max_records: usize) -> Result<ReadLengthEstimate, Error> {
    if max_records == 0 {
        return Err(Error::Validation(
            "read length sample size must be at least 1".into(),
        ));
    }

    let mut reader = open_reads(path)?;
    let mut line = Vec::new();
    let mut line_idx = 0usize;
    let mut records = 0u64;
    let mut total_len = 0u64;

    while (records as usize) < max_records {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| Error::io(e, path))?;
        if n == 0 {
            break;
        }

        if line_idx % LINES_PER_RECORD == SEQUENCE_LINE {
            total_len += trim_line_end(&line).len() as u64;
            records += 1;
        }
        line_idx += 1;
    }

    if records == 0 {
        return Err(Error::EmptyReadSample {
            path: path.to_path_buf(),
        });
    }

    Ok(ReadLengthEstimate {
        length: total_len / records,
        records,
    })
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
