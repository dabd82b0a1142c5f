use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::naming::{base_name, is_plain_file_name};
use crate::params::Parameters;
use crate::results::ReferenceFlag;

/// Name of the working directory holding the staged reads and every
/// intermediate stage output.
pub const WORK_DIR_NAME: &str = "TIDAL_out";
/// Name of the directory holding the staged reference inputs and indexes.
pub const REFERENCE_DIR_NAME: &str = "reference";

/// The user-supplied input files, as absolute paths.
///
/// After staging the same struct describes the staged copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    pub fastq: PathBuf,
    pub reference: PathBuf,
    pub consensus: PathBuf,
    pub annotation: PathBuf,
    pub gem: PathBuf,
    pub virus: PathBuf,
    pub masked: PathBuf,
    pub repeatmasker: PathBuf,
    pub table: PathBuf,
}

/// External programs the pipeline shells out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTools {
    /// Directory containing `data_prep.sh`, `insert_pipeline.sh`, ...
    pub code_dir: PathBuf,
    /// Interpreter for the stage scripts.
    pub shell: String,
    pub bowtie_build: String,
    pub bowtie2_build: String,
}

/// Validated, immutable pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub inputs: InputFiles,
    pub sample_name: String,
    pub processors: usize,
    pub out_dir: PathBuf,
    pub tools: ExternalTools,
    pub read_length_sample: usize,
    pub reference_flag: ReferenceFlag,
    pub command_log: Option<PathBuf>,
}

impl PipelineConfig {
    /// Resolve CLI parameters into absolute paths and check every input.
    ///
    /// Creates the output directory when it does not exist yet.
    pub fn from_params(params: &Parameters) -> Result<Self, Error> {
        let inputs = InputFiles {
            fastq: existing_file(&params.fastq)?,
            reference: existing_file(&params.reference)?,
            consensus: existing_file(&params.consensus)?,
            annotation: existing_file(&params.annotation)?,
            gem: existing_file(&params.gem)?,
            virus: existing_file(&params.virus)?,
            masked: existing_file(&params.masked)?,
            repeatmasker: existing_file(&params.repeatmasker)?,
            table: existing_file(&params.table)?,
        };

        let sample_name = match &params.sample_name {
            Some(name) => {
                if !is_plain_file_name(name) {
                    return Err(Error::Validation(format!(
                        "{name:?} is not a valid sample name"
                    )));
                }
                name.clone()
            }
            None => {
                let derived = base_name(&inputs.fastq);
                if !is_plain_file_name(&derived) {
                    return Err(Error::Validation(format!(
                        "cannot derive a sample name from {}; pass --sample-name",
                        inputs.fastq.display()
                    )));
                }
                derived
            }
        };

        fs::create_dir_all(&params.out).map_err(|e| {
            Error::Validation(format!(
                "cannot create output directory {}: {e}",
                params.out.display()
            ))
        })?;
        let out_dir = fs::canonicalize(&params.out).map_err(|e| Error::io(e, &params.out))?;

        let code_dir = match &params.code_dir {
            Some(dir) => existing_dir(dir)?,
            None => default_code_dir()?,
        };

        let command_log = params
            .command_log
            .as_ref()
            .map(|p| std::path::absolute(p).map_err(|e| Error::io(e, p)))
            .transpose()?;

        let reference_flag = match &params.reference_column {
            Some(column) => ReferenceFlag::Column(column.clone()),
            None => ReferenceFlag::AssumeNovel,
        };

        Ok(Self {
            inputs,
            sample_name,
            processors: params.processors,
            out_dir,
            tools: ExternalTools {
                code_dir,
                shell: params.shell.clone(),
                bowtie_build: params.bowtie_build.clone(),
                bowtie2_build: params.bowtie2_build.clone(),
            },
            read_length_sample: params.read_length_sample,
            reference_flag,
            command_log,
        })
    }

    /// Same configuration with the input paths replaced.
    pub fn with_inputs(&self, inputs: InputFiles) -> Self {
        Self {
            inputs,
            ..self.clone()
        }
    }

    /// `{out}/reference`
    pub fn reference_dir(&self) -> PathBuf {
        self.out_dir.join(REFERENCE_DIR_NAME)
    }

    /// `{out}/reference/chroms`
    pub fn chroms_dir(&self) -> PathBuf {
        self.reference_dir().join("chroms")
    }

    /// `{out}/reference/chrom_lengths.tsv`
    pub fn chrom_lengths_path(&self) -> PathBuf {
        self.reference_dir().join("chrom_lengths.tsv")
    }

    /// `{out}/TIDAL_out`
    pub fn work_dir(&self) -> PathBuf {
        self.out_dir.join(WORK_DIR_NAME)
    }

    /// `{out}/TIDAL_out/{sample}_result`
    pub fn result_dir(&self) -> PathBuf {
        self.work_dir().join(format!("{}_result", self.sample_name))
    }

    /// Final insertion table written by the aggregation stage.
    pub fn insertion_table_path(&self) -> PathBuf {
        self.result_dir()
            .join(format!("{}_Inserts_Annotated.txt", self.sample_name))
    }

    /// Interval file produced from the insertion table.
    pub fn bed_path(&self) -> PathBuf {
        self.result_dir()
            .join(format!("{}_TIDAL_tmp.bed", self.sample_name))
    }
}

fn existing_file(path: &Path) -> Result<PathBuf, Error> {
    let resolved = fs::canonicalize(path)
        .map_err(|_| Error::Validation(format!("cannot find file: {}", path.display())))?;
    if !resolved.is_file() {
        return Err(Error::Validation(format!(
            "not a regular file: {}",
            path.display()
        )));
    }
    fs::File::open(&resolved)
        .map_err(|e| Error::Validation(format!("cannot read {}: {e}", path.display())))?;
    Ok(resolved)
}

fn existing_dir(path: &Path) -> Result<PathBuf, Error> {
    let resolved = fs::canonicalize(path)
        .map_err(|_| Error::Validation(format!("cannot find directory: {}", path.display())))?;
    if !resolved.is_dir() {
        return Err(Error::Validation(format!(
            "not a directory: {}",
            path.display()
        )));
    }
    Ok(resolved)
}

/// The stage scripts ship alongside the executable.
fn default_code_dir() -> Result<PathBuf, Error> {
    let exe = std::env::current_exe()
        .map_err(|e| Error::Validation(format!("cannot locate the running executable: {e}")))?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        Error::Validation(format!(
            "cannot determine the script directory from {}; pass --code-dir",
            exe.display()
        ))
    })
}
