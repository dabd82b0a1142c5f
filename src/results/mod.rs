/// Translation of the final insertion table into interval format
pub mod bed;
pub mod table;

pub use bed::write_bed;
pub use table::{InsertionRecord, ReferenceFlag, parse_insertion_table};

use crate::config::PipelineConfig;
use crate::error::Error;

/// Parse the aggregated insertion table and write `{sample}_TIDAL_tmp.bed`
/// next to it. Returns the number of intervals written.
pub fn translate_results(config: &PipelineConfig) -> Result<usize, Error> {
    let table_path = config.insertion_table_path();
    log::info!("Reading insertion table {}", table_path.display());

    let records = parse_insertion_table(&table_path, &config.reference_flag)?;
    write_bed(&config.bed_path(), &config.sample_name, &records)
}
