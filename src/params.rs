use std::path::PathBuf;

use clap::Parser;

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::io::fastq::DEFAULT_READ_SAMPLE;

// ---------------------------------------------------------------------------
// Parameters struct
// ---------------------------------------------------------------------------

/// ruTIDAL command-line parameters.
///
/// The short flags match the TIDAL.py driver so existing job scripts
/// keep working.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ruTIDAL",
    about = "Pipeline driver to identify Transposon Insertion and Depletion in flies",
    version
)]
pub struct Parameters {
    // ── Required inputs ─────────────────────────────────────────────────
    /// A FASTQ file containing the NGS reads (plain or .gz)
    #[arg(short = 'f', long = "fastq")]
    pub fastq: PathBuf,

    /// A reference genome sequence in FASTA format
    #[arg(short = 'r', long = "reference")]
    pub reference: PathBuf,

    /// The consensus sequences of the TEs in FASTA format
    #[arg(short = 'c', long = "consensus")]
    pub consensus: PathBuf,

    /// The RefSeq annotation from the UCSC genome browser
    #[arg(short = 'a', long = "annotation")]
    pub annotation: PathBuf,

    /// The GEM mappability file used by FREEC
    #[arg(short = 'g', long = "gem")]
    pub gem: PathBuf,

    /// Curated virus, structural and repbase sequences in FASTA format
    #[arg(short = 'v', long = "virus")]
    pub virus: PathBuf,

    /// A reference genome sequence masked by RepeatMasker
    #[arg(short = 'm', long = "masked")]
    pub masked: PathBuf,

    /// RepeatMasker track from the UCSC genome browser (rmsk, all fields)
    #[arg(short = 'n', long = "repeatmasker")]
    pub repeatmasker: PathBuf,

    /// Custom table for repbase to flybase lookup
    #[arg(short = 't', long = "table")]
    pub table: PathBuf,

    // ── Run ─────────────────────────────────────────────────────────────
    /// Number of CPU threads handed to the external tools
    #[arg(short = 'p', long = "processors", default_value_t = 1)]
    pub processors: usize,

    /// Sample name used for output files (default: FASTQ name)
    #[arg(short = 's', long = "sample-name")]
    pub sample_name: Option<String>,

    /// Directory to create the output files in
    #[arg(short = 'o', long = "out", default_value = ".")]
    pub out: PathBuf,

    // ── External tools ──────────────────────────────────────────────────
    /// Directory holding the stage scripts (default: next to the executable)
    #[arg(long = "code-dir")]
    pub code_dir: Option<PathBuf>,

    /// Interpreter used to run the stage scripts
    #[arg(long = "shell", default_value = "bash")]
    pub shell: String,

    /// bowtie index builder
    #[arg(long = "bowtie-build", default_value = "bowtie-build")]
    pub bowtie_build: String,

    /// bowtie2 index builder
    #[arg(long = "bowtie2-build", default_value = "bowtie2-build")]
    pub bowtie2_build: String,

    // ── Misc ────────────────────────────────────────────────────────────
    /// Number of FASTQ records sampled to estimate the read length
    #[arg(long = "read-length-sample", default_value_t = DEFAULT_READ_SAMPLE)]
    pub read_length_sample: usize,

    /// Insertion table column marking reference (annotated) insertions.
    /// Without it every insertion is reported as non-reference.
    #[arg(long = "reference-column")]
    pub reference_column: Option<String>,

    /// Append every external command and its output to this file
    #[arg(long = "command-log")]
    pub command_log: Option<PathBuf>,
}

impl Parameters {
    /// Check the raw arguments and resolve them into a [`PipelineConfig`].
    pub fn validate(&self) -> Result<PipelineConfig, Error> {
        if self.processors == 0 {
            return Err(Error::Validation("--processors must be >= 1".into()));
        }

        if self.read_length_sample == 0 {
            return Err(Error::Validation(
                "--read-length-sample must be >= 1".into(),
            ));
        }

        if let Some(column) = &self.reference_column {
            if column.trim().is_empty() {
                return Err(Error::Validation(
                    "--reference-column must not be empty".into(),
                ));
            }
        }

        PipelineConfig::from_params(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 18] = [
        "-f",
        "reads.fastq",
        "-r",
        "dm6.fa",
        "-c",
        "consensus.fa",
        "-a",
        "refflat.txt",
        "-g",
        "dm6.gem",
        "-v",
        "virus.fa",
        "-m",
        "dm6.fa.masked",
        "-n",
        "rmsk.txt",
        "-t",
        "lookup.txt",
    ];

    fn parse(extra: &[&str]) -> Parameters {
        let mut full = vec!["ruTIDAL"];
        full.extend_from_slice(&REQUIRED);
        full.extend_from_slice(extra);
        Parameters::parse_from(full)
    }

    #[test]
    fn defaults() {
        let p = parse(&[]);
        assert_eq!(p.fastq, PathBuf::from("reads.fastq"));
        assert_eq!(p.masked, PathBuf::from("dm6.fa.masked"));
        assert_eq!(p.processors, 1);
        assert!(p.sample_name.is_none());
        assert_eq!(p.out, PathBuf::from("."));
        assert!(p.code_dir.is_none());
        assert_eq!(p.shell, "bash");
        assert_eq!(p.bowtie_build, "bowtie-build");
        assert_eq!(p.bowtie2_build, "bowtie2-build");
        assert_eq!(p.read_length_sample, 10_000);
        assert!(p.reference_column.is_none());
        assert!(p.command_log.is_none());
    }

    #[test]
    fn long_options() {
        let p = parse(&[
            "--processors",
            "8",
            "--sample-name",
            "w1118",
            "--out",
            "/scratch/tidal",
            "--code-dir",
            "/opt/TIDAL/CODE",
            "--reference-column",
            "Is_Ref",
        ]);
        assert_eq!(p.processors, 8);
        assert_eq!(p.sample_name.as_deref(), Some("w1118"));
        assert_eq!(p.out, PathBuf::from("/scratch/tidal"));
        assert_eq!(p.code_dir, Some(PathBuf::from("/opt/TIDAL/CODE")));
        assert_eq!(p.reference_column.as_deref(), Some("Is_Ref"));
    }

    #[test]
    fn missing_required_input_is_rejected() {
        let result = Parameters::try_parse_from(["ruTIDAL", "-f", "reads.fastq"]);
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_zero_processors() {
        let p = parse(&["-p", "0"]);
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("--processors"));
    }

    #[test]
    fn validate_rejects_zero_sample() {
        let p = parse(&["--read-length-sample", "0"]);
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("--read-length-sample"));
    }

    #[test]
    fn validate_reports_missing_files() {
        let p = parse(&[]);
        let err = p.validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("cannot find file"));
    }
}
