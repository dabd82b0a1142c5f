/// Final insertion table parsing
///
/// The aggregation stage writes `{sample}_Inserts_Annotated.txt`, a
/// tab-separated table with a header row. Only five columns are needed to
/// build interval records:
/// 1. `Chr`: chromosome
/// 2. `Chr_coord_5p`: 5' coordinate (0-based)
/// 3. `Chr_coord_3p`: 3' coordinate
/// 4. `TE`: transposon family
/// 5. `Coverage_Ratio`: supporting/total coverage ratio
///
/// Any further columns are kept verbatim in [`InsertionRecord::extra`].
use crate::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const COL_CHROM: &str = "Chr";
pub const COL_START: &str = "Chr_coord_5p";
pub const COL_END: &str = "Chr_coord_3p";
pub const COL_TE: &str = "TE";
pub const COL_COVERAGE_RATIO: &str = "Coverage_Ratio";

const REQUIRED_COLUMNS: [&str; 5] = [COL_CHROM, COL_START, COL_END, COL_TE, COL_COVERAGE_RATIO];

/// Values accepted as "this insertion is at an annotated reference site"
const REFERENCE_VALUES: [&str; 6] = ["1", "true", "yes", "y", "ref", "reference"];

/// How the reference/non-reference flag of an insertion is derived
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReferenceFlag {
    /// No column carries the flag; every insertion is treated as novel
    #[default]
    AssumeNovel,
    /// The named column carries the flag
    Column(String),
}

/// One data row of the insertion table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionRecord {
    pub chrom: String,
    pub start: String,
    pub end: String,
    pub te: String,
    pub coverage_ratio: String,
    /// Insertion matches an annotated reference transposon
    pub is_reference: bool,
    /// Remaining columns as (header, value), in table order
    pub extra: Vec<(String, String)>,
}

/// Column positions resolved from the header row
struct Header {
    names: Vec<String>,
    required: [usize; 5],
    flag: Option<usize>,
}

impl Header {
    fn parse(line: &str, flag: &ReferenceFlag, path: &Path) -> Result<Self, Error> {
        let names: Vec<String> = line.split('\t').map(str::to_string).collect();
        let position = |column: &str| names.iter().position(|n| n == column);

        let mut required = [0usize; 5];
        for (slot, column) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = position(column).ok_or_else(|| {
                Error::table(path, format!("missing required column '{column}'"))
            })?;
        }

        let flag = match flag {
            ReferenceFlag::AssumeNovel => None,
            ReferenceFlag::Column(column) => Some(position(column).ok_or_else(|| {
                Error::table(path, format!("missing reference flag column '{column}'"))
            })?),
        };

        Ok(Self {
            names,
            required,
            flag,
        })
    }

    fn record(&self, fields: &[&str]) -> InsertionRecord {
        let [chrom, start, end, te, ratio] = self.required.map(|i| fields[i].to_string());
        let is_reference = self.flag.is_some_and(|i| is_reference_value(fields[i]));
        let extra = self
            .names
            .iter()
            .zip(fields)
            .enumerate()
            .filter(|(i, _)| !self.required.contains(i))
            .map(|(_, (name, value))| (name.clone(), value.to_string()))
            .collect();

        InsertionRecord {
            chrom,
            start,
            end,
            te,
            coverage_ratio: ratio,
            is_reference,
            extra,
        }
    }
}

fn trim_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

fn is_reference_value(value: &str) -> bool {
    let value = value.trim();
    REFERENCE_VALUES
        .iter()
        .any(|v| v.eq_ignore_ascii_case(value))
}

/// Parse the insertion table at `path`, keeping rows in file order
///
/// Fails when the header lacks a required column (or the configured flag
/// column), or when a data row has a different field count than the header.
/// Blank lines are skipped.
pub fn parse_insertion_table(
    path: &Path,
    flag: &ReferenceFlag,
) -> Result<Vec<InsertionRecord>, Error> {
    let file = File::open(path).map_err(|e| Error::io(e, path))?;
    let mut lines = BufReader::new(file).lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => {
            let line = line.map_err(|e| Error::io(e, path))?;
            Header::parse(trim_cr(&line), flag, path)?
        }
        None => return Err(Error::table(path, "table is empty (no header row)")),
    };

    let mut records = Vec::new();
    for (line_idx, line) in lines {
        let line = line.map_err(|e| Error::io(e, path))?;
        let line = trim_cr(&line);
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != header.names.len() {
            return Err(Error::table(
                path,
                format!(
                    "line {} has {} fields, header has {}",
                    line_idx + 1,
                    fields.len(),
                    header.names.len()
                ),
            ));
        }

        records.push(header.record(&fields));
    }

    Ok(records)
}
