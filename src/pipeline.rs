//! Stage orchestration.
//!
//! The pipeline is a straight line of steps: stage the inputs, split the
//! reference, build indexes, estimate the read length, run the five stage
//! scripts (checking each one's artifact), then translate the final
//! insertion table. Any error is terminal.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::index::build_indexes;
use crate::io::fastq::estimate_read_length;
use crate::naming::strip_extension;
use crate::reference::split_reference;
use crate::results::translate_results;
use crate::runner::{FailurePolicy, PipelineArtifact, StageCommand, StageRunner};
use crate::staging::stage_inputs;

/// Progress through the pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Start,
    Staged,
    Indexed,
    DataPrepped,
    InsertionsDone,
    DepletionSetupDone,
    DepletionsDone,
    Aggregated,
    Translated,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Start => "START",
            PipelineState::Staged => "STAGED",
            PipelineState::Indexed => "INDEXED",
            PipelineState::DataPrepped => "DATA_PREPPED",
            PipelineState::InsertionsDone => "INSERTIONS_DONE",
            PipelineState::DepletionSetupDone => "DEPLETION_SETUP_DONE",
            PipelineState::DepletionsDone => "DEPLETIONS_DONE",
            PipelineState::Aggregated => "AGGREGATED",
            PipelineState::Translated => "TRANSLATED",
            PipelineState::Done => "DONE",
            PipelineState::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

/// One stage script: its command, the artifact it must leave behind, and
/// the state reached once both check out.
#[derive(Debug, Clone)]
pub struct ScriptStage {
    pub command: StageCommand,
    pub artifact: PipelineArtifact,
    pub reached: PipelineState,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub sample_name: String,
    pub chromosomes: usize,
    pub read_length: u64,
    pub intervals: usize,
    pub bed_path: PathBuf,
}

/// The five stage scripts for a staged configuration, in run order.
///
/// Every script runs as `{shell} {code_dir}/{script} ...` inside
/// `{out}/TIDAL_out`.
pub fn script_stages(config: &PipelineConfig, read_length: u64) -> Vec<ScriptStage> {
    let inputs = &config.inputs;
    let code_dir = &config.tools.code_dir;
    let work_dir = config.work_dir();
    let result_dir = config.result_dir();
    let sample = &config.sample_name;

    let fastq: OsString = inputs
        .fastq
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    let mut polyn = fastq.clone();
    polyn.push(".uq.polyn");
    let mut chroms_dir = config.chroms_dir().into_os_string();
    chroms_dir.push("/");

    let processors = config.processors.to_string();
    let read_length = read_length.to_string();
    let chrom_lengths = config.chrom_lengths_path();

    let script = |name: &str| {
        StageCommand::new(name, &config.tools.shell, &work_dir).arg(code_dir.join(name))
    };

    let data_prep = script("data_prep.sh")
        .arg(&fastq)
        .arg(code_dir)
        .arg(&processors);

    let insert = script("insert_pipeline.sh")
        .arg(&polyn)
        .arg(&read_length)
        .arg(code_dir)
        .arg(strip_extension(&inputs.reference))
        .arg(strip_extension(&inputs.masked))
        .arg(strip_extension(&inputs.consensus))
        .arg(&inputs.reference)
        .arg(&inputs.annotation)
        .arg(&chrom_lengths)
        .arg(&chroms_dir)
        .arg(&inputs.gem)
        .arg(strip_extension(&inputs.virus))
        .arg(&inputs.consensus)
        .arg(&processors);

    let setup = script("setup.sh").arg(&fastq);

    let depletion = script("depletion_pipeline.sh")
        .arg(&polyn)
        .arg(&read_length)
        .arg(code_dir)
        .arg(strip_extension(&inputs.reference))
        .arg(strip_extension(&inputs.masked))
        .arg(strip_extension(&inputs.consensus))
        .arg(&inputs.reference)
        .arg(&inputs.masked)
        .arg(&inputs.repeatmasker)
        .arg(&inputs.annotation)
        .arg(&inputs.table)
        .arg(&chrom_lengths)
        .arg(&processors);

    let last_part = script("last_part.sh").arg(&fastq).arg(code_dir);

    let stage = |command: StageCommand, artifact: PipelineArtifact, reached| ScriptStage {
        command,
        artifact,
        reached,
    };

    vec![
        stage(
            data_prep,
            PipelineArtifact::file("data_prep.sh", work_dir.join(&polyn)),
            PipelineState::DataPrepped,
        ),
        stage(
            insert,
            PipelineArtifact::file(
                "insert_pipeline.sh",
                work_dir
                    .join("insertion")
                    .join(format!("{sample}_Inserts_Annotated.txt")),
            ),
            PipelineState::InsertionsDone,
        ),
        stage(
            setup,
            PipelineArtifact::directory("setup.sh", work_dir.join("depletion")),
            PipelineState::DepletionSetupDone,
        ),
        stage(
            depletion,
            PipelineArtifact::file(
                "depletion_pipeline.sh",
                work_dir
                    .join("depletion")
                    .join(format!("{sample}_Depletion_Annotated.txt")),
            ),
            PipelineState::DepletionsDone,
        ),
        stage(
            last_part,
            PipelineArtifact::file(
                "last_part.sh",
                result_dir.join(format!("{sample}_Depletion_Annotated.txt")),
            ),
            PipelineState::Aggregated,
        ),
    ]
}

/// Tracks and logs state transitions.
#[derive(Debug)]
struct Progress {
    state: PipelineState,
}

impl Progress {
    fn new() -> Self {
        log::info!("Pipeline state: {}", PipelineState::Start);
        Self {
            state: PipelineState::Start,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        log::info!("Pipeline state: {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: &Error) {
        log::error!("Pipeline FAILED at state {}: {}", self.state, err);
        self.state = PipelineState::Failed;
    }
}

/// Run every step for a validated configuration.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineSummary, Error> {
    let mut progress = Progress::new();
    let result = run_steps(config, &mut progress);
    if let Err(e) = &result {
        progress.fail(e);
    }
    result
}

fn run_steps(config: &PipelineConfig, progress: &mut Progress) -> Result<PipelineSummary, Error> {
    let staged = stage_inputs(config)?;
    let chromosomes = split_reference(
        &staged.inputs.reference,
        &staged.chroms_dir(),
        &staged.chrom_lengths_path(),
    )?;
    progress.advance(PipelineState::Staged);

    let runner = StageRunner::new(staged.command_log.clone());
    build_indexes(&staged, &runner)?;
    progress.advance(PipelineState::Indexed);

    let estimate = estimate_read_length(&staged.inputs.fastq, staged.read_length_sample)?;
    log::info!(
        "Read length: {} (mean over {} reads)",
        estimate,
        estimate.records
    );

    for stage in script_stages(&staged, estimate.length) {
        runner.run(&stage.command, FailurePolicy::Fatal)?;
        stage.artifact.verify()?;
        progress.advance(stage.reached);
    }

    let intervals = translate_results(&staged)?;
    progress.advance(PipelineState::Translated);

    progress.advance(PipelineState::Done);
    Ok(PipelineSummary {
        sample_name: staged.sample_name.clone(),
        chromosomes: chromosomes.len(),
        read_length: estimate.length,
        intervals,
        bed_path: staged.bed_path(),
    })
}
