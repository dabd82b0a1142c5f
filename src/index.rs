use std::path::Path;

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::naming::base_name;
use crate::runner::{FailurePolicy, StageCommand, StageRunner};

/// Index-build commands for the staged sequences, in build order.
///
/// bowtie indexes are needed for the contaminant, consensus, reference and
/// masked sequences; bowtie2 indexes for the consensus and reference. Each
/// index is written next to its FASTA file under the file's base name.
pub fn index_commands(config: &PipelineConfig) -> Vec<StageCommand> {
    let staged = &config.inputs;
    let tools = &config.tools;
    let ref_dir = config.reference_dir();

    let build = |program: &str, fasta: &Path| {
        StageCommand::new(format!("{program} {}", base_name(fasta)), program, &ref_dir)
            .arg(fasta)
            .arg(base_name(fasta))
    };

    vec![
        build(tools.bowtie_build.as_str(), &staged.virus),
        build(tools.bowtie_build.as_str(), &staged.consensus),
        build(tools.bowtie2_build.as_str(), &staged.consensus),
        build(tools.bowtie_build.as_str(), &staged.reference),
        build(tools.bowtie2_build.as_str(), &staged.reference),
        build(tools.bowtie_build.as_str(), &staged.masked),
    ]
}

/// Build every alignment index; the first failure aborts.
pub fn build_indexes(config: &PipelineConfig, runner: &StageRunner) -> Result<(), Error> {
    let commands = index_commands(config);
    log::info!("Building {} alignment indexes", commands.len());
    for cmd in &commands {
        runner.run(cmd, FailurePolicy::Fatal)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExternalTools, InputFiles};
    use crate::results::ReferenceFlag;
    use std::path::PathBuf;

    fn staged_config() -> PipelineConfig {
        let r = PathBuf::from("/out/reference");
        PipelineConfig {
            inputs: InputFiles {
                fastq: PathBuf::from("/out/TIDAL_out/s.fastq"),
                reference: r.join("dm6.fa"),
                consensus: r.join("consensus.fasta"),
                annotation: r.join("refflat.txt"),
                gem: r.join("dm6.gem"),
                virus: r.join("virus.fa"),
                masked: r.join("masked.dm6.fa"),
                repeatmasker: r.join("rmsk.txt"),
                table: r.join("lookup.txt"),
            },
            sample_name: "s".into(),
            processors: 4,
            out_dir: PathBuf::from("/out"),
            tools: ExternalTools {
                code_dir: PathBuf::from("/opt/tidal"),
                shell: "bash".into(),
                bowtie_build: "bowtie-build".into(),
                bowtie2_build: "bowtie2-build".into(),
            },
            read_length_sample: 10_000,
            reference_flag: ReferenceFlag::AssumeNovel,
            command_log: None,
        }
    }

    #[test]
    fn build_order_and_prefixes() {
        let commands = index_commands(&staged_config());
        let lines: Vec<String> = commands.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "bowtie-build /out/reference/virus.fa virus",
                "bowtie-build /out/reference/consensus.fasta consensus",
                "bowtie2-build /out/reference/consensus.fasta consensus",
                "bowtie-build /out/reference/dm6.fa dm6",
                "bowtie2-build /out/reference/dm6.fa dm6",
                "bowtie-build /out/reference/masked.dm6.fa masked.dm6",
            ]
        );
    }

    #[test]
    fn builds_run_in_reference_dir() {
        for cmd in index_commands(&staged_config()) {
            assert_eq!(cmd.working_dir, PathBuf::from("/out/reference"));
        }
    }
}
