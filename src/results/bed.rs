/// Interval output for novel insertions
///
/// Format (6 tab-separated columns, after one `track` line):
/// 1. chromosome
/// 2. start (0-based, as reported in the insertion table)
/// 3. end
/// 4. name: `{TE}|non-reference|{coverage_ratio}|{sample}|sr|{index}`
/// 5. score (always 0)
/// 6. strand (always `.`)
use crate::error::Error;
use crate::results::table::InsertionRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Method tag carried in every interval name (split-read evidence)
const METHOD_TAG: &str = "sr";

/// Track declaration preceding the data lines
pub fn track_line(sample: &str) -> String {
    format!("track name=\"{sample}_popoolationte\" description=\"{sample}_popoolationte\"")
}

/// Name column for the record at `index` (its position among all parsed rows)
pub fn interval_name(record: &InsertionRecord, sample: &str, index: usize) -> String {
    format!(
        "{}|non-reference|{}|{}|{}|{}",
        record.te, record.coverage_ratio, sample, METHOD_TAG, index
    )
}

/// Write the interval file for every non-reference record
///
/// Returns the number of data lines written. Reference records are skipped
/// but still consume an index.
pub fn write_bed(path: &Path, sample: &str, records: &[InsertionRecord]) -> Result<usize, Error> {
    let file = File::create(path).map_err(|e| Error::io(e, path))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", track_line(sample)).map_err(|e| Error::io(e, path))?;

    let mut written = 0;
    for (index, record) in records.iter().enumerate() {
        if record.is_reference {
            continue;
        }
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t0\t.",
            record.chrom,
            record.start,
            record.end,
            interval_name(record, sample, index)
        )
        .map_err(|e| Error::io(e, path))?;
        written += 1;
    }

    writer.flush().map_err(|e| Error::io(e, path))?;

    log::info!(
        "Wrote {} of {} insertions to {}",
        written,
        records.len(),
        path.display()
    );
    Ok(written)
}
