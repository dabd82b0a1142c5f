use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use noodles::fasta;

use crate::error::Error;
use crate::naming::is_plain_file_name;

/// Ordered sequence name -> length table of the staged reference genome.
///
/// Persisted as `chrom_lengths.tsv`: one `name\tlength` row per sequence, in
/// the order the sequences appear in the FASTA file, no header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromosomeIndex {
    entries: Vec<(String, u64)>,
}

impl ChromosomeIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split the staged reference into per-sequence FASTA files and write the
/// name/length index.
///
/// Records are streamed one at a time. Each sequence lands in
/// `{chroms_dir}/{name}.fa` as a single header line followed by the whole
/// sequence on one line.
pub fn split_reference(
    reference: &Path,
    chroms_dir: &Path,
    index_path: &Path,
) -> Result<ChromosomeIndex, Error> {
    fs::create_dir_all(chroms_dir).map_err(|e| Error::io(e, chroms_dir))?;

    let file = File::open(reference).map_err(|e| Error::io(e, reference))?;
    let mut reader = fasta::io::Reader::new(BufReader::new(file));

    let index_file = File::create(index_path).map_err(|e| Error::io(e, index_path))?;
    let mut index_out = BufWriter::new(index_file);

    let mut index = ChromosomeIndex::default();
    let mut seen = HashSet::new();

    for result in reader.records() {
        let record = result.map_err(|e| {
            Error::Staging(format!("cannot parse reference {}: {e}", reference.display()))
        })?;
        let name = String::from_utf8_lossy(record.name()).into_owned();

        if !is_plain_file_name(&name) {
            return Err(Error::Staging(format!(
                "sequence name {name:?} in {} cannot be used as a file name",
                reference.display()
            )));
        }
        if !seen.insert(name.clone()) {
            return Err(Error::Staging(format!(
                "duplicate sequence name {name:?} in {}",
                reference.display()
            )));
        }

        let sequence: &[u8] = record.sequence().as_ref();
        let len = sequence.len() as u64;

        writeln!(index_out, "{}\t{}", name, len).map_err(|e| Error::io(e, index_path))?;
        write_single_sequence(&chrom_path(chroms_dir, &name), &name, sequence)?;

        index.entries.push((name, len));
    }

    index_out.flush().map_err(|e| Error::io(e, index_path))?;

    if index.is_empty() {
        return Err(Error::Staging(format!(
            "no sequences found in reference {}",
            reference.display()
        )));
    }

    log::info!(
        "Split reference into {} sequences ({})",
        index.len(),
        chroms_dir.display()
    );

    Ok(index)
}

/// `{chroms_dir}/{name}.fa`
pub fn chrom_path(chroms_dir: &Path, name: &str) -> PathBuf {
    chroms_dir.join(format!("{name}.fa"))
}

fn write_single_sequence(path: &Path, name: &str, sequence: &[u8]) -> Result<(), Error> {
    let file = File::create(path).map_err(|e| Error::io(e, path))?;
    let mut out = BufWriter::new(file);
    writeln!(out, ">{}", name).map_err(|e| Error::io(e, path))?;
    out.write_all(sequence).map_err(|e| Error::io(e, path))?;
    out.write_all(b"\n").map_err(|e| Error::io(e, path))?;
    out.flush().map_err(|e| Error::io(e, path))
}
