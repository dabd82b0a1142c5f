#![allow(non_snake_case)]

pub mod config;
pub mod error;
pub mod index;
pub mod io;
pub mod naming;
pub mod params;
pub mod pipeline;
pub mod reference;
pub mod results;
pub mod runner;
pub mod staging;

use log::info;

use crate::params::Parameters;

/// Top-level entry point. Called from `main()` after CLI parsing.
pub fn run(params: &Parameters) -> anyhow::Result<()> {
    let config = params.validate()?;

    info!("ruTIDAL v{}", env!("CARGO_PKG_VERSION"));
    info!("sample: {}", config.sample_name);
    info!("fastq: {}", config.inputs.fastq.display());
    info!("reference: {}", config.inputs.reference.display());
    info!("processors: {}", config.processors);
    info!("out: {}", config.out_dir.display());
    info!("code dir: {}", config.tools.code_dir.display());

    let summary = pipeline::run_pipeline(&config)?;

    info!(
        "TIDAL run complete: {} sequences, read length {}, {} insertions in {}",
        summary.chromosomes,
        summary.read_length,
        summary.intervals,
        summary.bed_path.display()
    );
    Ok(())
}
