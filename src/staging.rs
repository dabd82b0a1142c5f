use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{InputFiles, PipelineConfig};
use crate::error::Error;
use crate::io::fastq::{is_gzipped, open_reads};
use crate::naming::base_name;

/// Copy every input into the working layout and return a configuration
/// pointing at the copies.
///
/// Layout:
/// - `{out}/reference/`: reference inputs under their own names, except the
///   masked genome which becomes `masked.{base}` so it cannot collide with
///   the unmasked reference
/// - `{out}/TIDAL_out/{sample}.fastq`: reads, decompressed if needed
pub fn stage_inputs(config: &PipelineConfig) -> Result<PipelineConfig, Error> {
    let ref_dir = config.reference_dir();
    let work_dir = config.work_dir();
    create_dir(&ref_dir)?;

    let src = &config.inputs;
    let masked_name = format!("masked.{}", base_name(&src.masked));

    let reference = copy_into(&src.reference, &ref_dir, None)?;
    let consensus = copy_into(&src.consensus, &ref_dir, None)?;
    let annotation = copy_into(&src.annotation, &ref_dir, None)?;
    let gem = copy_into(&src.gem, &ref_dir, None)?;
    let virus = copy_into(&src.virus, &ref_dir, None)?;
    let masked = copy_into(&src.masked, &ref_dir, Some(&masked_name))?;
    let repeatmasker = copy_into(&src.repeatmasker, &ref_dir, None)?;
    let table = copy_into(&src.table, &ref_dir, None)?;

    create_dir(&work_dir)?;
    let fastq = stage_reads(&src.fastq, &work_dir, &config.sample_name)?;

    Ok(config.with_inputs(InputFiles {
        fastq,
        reference,
        consensus,
        annotation,
        gem,
        virus,
        masked,
        repeatmasker,
        table,
    }))
}

/// Copy the read file to `{work_dir}/{sample}.fastq`, gunzipping `.gz` input.
pub fn stage_reads(src: &Path, work_dir: &Path, sample_name: &str) -> Result<PathBuf, Error> {
    let dest = work_dir.join(format!("{sample_name}.fastq"));

    if is_same_file(src, &dest) {
        log::info!("{} is already staged", dest.display());
        return Ok(dest);
    }

    if is_gzipped(src) {
        log::info!("Decompressing {} -> {}", src.display(), dest.display());
        let mut reader = open_reads(src)?;
        let file = File::create(&dest).map_err(|e| staging_io("create", &dest, e))?;
        let mut writer = BufWriter::new(file);
        io::copy(&mut reader, &mut writer).map_err(|e| staging_io("decompress", src, e))?;
        writer
            .flush()
            .map_err(|e| staging_io("write", &dest, e))?;
    } else {
        log::info!("Copying {} -> {}", src.display(), dest.display());
        fs::copy(src, &dest).map_err(|e| staging_io("copy", src, e))?;
    }

    Ok(dest)
}

/// Copy `src` into `dir` under its own file name or `rename`.
fn copy_into(src: &Path, dir: &Path, rename: Option<&str>) -> Result<PathBuf, Error> {
    let dest = match rename {
        Some(name) => dir.join(name),
        None => {
            let name = src.file_name().ok_or_else(|| {
                Error::Staging(format!("{} has no file name", src.display()))
            })?;
            dir.join(name)
        }
    };

    if is_same_file(src, &dest) {
        log::info!("{} is already staged", dest.display());
        return Ok(dest);
    }

    log::debug!("Copying {} -> {}", src.display(), dest.display());
    fs::copy(src, &dest).map_err(|e| staging_io("copy", src, e))?;
    Ok(dest)
}

/// Copying a file onto itself truncates it.
fn is_same_file(src: &Path, dest: &Path) -> bool {
    match (fs::canonicalize(src), fs::canonicalize(dest)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn create_dir(dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(dir).map_err(|e| staging_io("create directory", dir, e))
}

fn staging_io(action: &str, path: &Path, err: io::Error) -> Error {
    Error::Staging(format!("cannot {action} {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExternalTools;
    use crate::results::ReferenceFlag;
    use std::io::Write;
    use tempfile::TempDir;

    fn make_config(src: &Path, out: &Path, fastq_name: &str) -> PipelineConfig {
        let inputs = InputFiles {
            fastq: src.join(fastq_name),
            reference: src.join("dm6.fa"),
            consensus: src.join("consensus.fa"),
            annotation: src.join("refflat.txt"),
            gem: src.join("dm6.gem"),
            virus: src.join("virus.fa"),
            masked: src.join("dm6.fa.masked"),
            repeatmasker: src.join("rmsk.txt"),
            table: src.join("lookup.txt"),
        };
        for path in [
            &inputs.reference,
            &inputs.consensus,
            &inputs.annotation,
            &inputs.gem,
            &inputs.virus,
            &inputs.masked,
            &inputs.repeatmasker,
            &inputs.table,
        ] {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            fs::write(path, format!(">{name}\nACGT\n")).unwrap();
        }

        PipelineConfig {
            inputs,
            sample_name: "sample1".to_string(),
            processors: 1,
            out_dir: out.to_path_buf(),
            tools: ExternalTools {
                code_dir: src.to_path_buf(),
                shell: "bash".into(),
                bowtie_build: "bowtie-build".into(),
                bowtie2_build: "bowtie2-build".into(),
            },
            read_length_sample: 10,
            reference_flag: ReferenceFlag::AssumeNovel,
            command_log: None,
        }
    }

    #[test]
    fn copies_into_layout_and_renames_masked() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(src.path().join("reads.fq"), "@r\nACGT\n+\nIIII\n").unwrap();
        let config = make_config(src.path(), out.path(), "reads.fq");

        let staged = stage_inputs(&config).unwrap();
        let ref_dir = out.path().join("reference");

        assert_eq!(staged.inputs.reference, ref_dir.join("dm6.fa"));
        assert_eq!(staged.inputs.masked, ref_dir.join("masked.dm6.fa"));
        assert_eq!(staged.inputs.table, ref_dir.join("lookup.txt"));
        assert_eq!(
            staged.inputs.fastq,
            out.path().join("TIDAL_out").join("sample1.fastq")
        );
        assert_eq!(
            fs::read(&staged.inputs.masked).unwrap(),
            fs::read(src.path().join("dm6.fa.masked")).unwrap()
        );
        // originals untouched
        assert_eq!(config.inputs.reference, src.path().join("dm6.fa"));
    }

    #[test]
    fn gzipped_reads_are_decompressed() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let gz_path = src.path().join("reads.fastq.gz");
        let mut encoder = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::default());
        write!(encoder, "@r1\nACGTACGT\n+\nIIIIIIII\n").unwrap();
        encoder.finish().unwrap();

        let config = make_config(src.path(), out.path(), "reads.fastq.gz");
        let staged = stage_inputs(&config).unwrap();

        assert!(staged.inputs.fastq.ends_with("TIDAL_out/sample1.fastq"));
        assert_eq!(
            fs::read_to_string(&staged.inputs.fastq).unwrap(),
            "@r1\nACGTACGT\n+\nIIIIIIII\n"
        );
    }

    #[test]
    fn restaging_is_byte_identical() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("reads.fq"), "@r\nACGT\n+\nIIII\n").unwrap();

        let out1 = TempDir::new().unwrap();
        let out2 = TempDir::new().unwrap();
        let first = stage_inputs(&make_config(src.path(), out1.path(), "reads.fq")).unwrap();
        let second = stage_inputs(&make_config(src.path(), out2.path(), "reads.fq")).unwrap();

        for (a, b) in [
            (&first.inputs.reference, &second.inputs.reference),
            (&first.inputs.masked, &second.inputs.masked),
            (&first.inputs.fastq, &second.inputs.fastq),
        ] {
            assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
        }
    }

    #[test]
    fn inputs_already_in_place_are_left_intact() {
        let out = TempDir::new().unwrap();
        let ref_dir = out.path().join("reference");
        let work_dir = out.path().join("TIDAL_out");
        fs::create_dir_all(&ref_dir).unwrap();
        fs::create_dir_all(&work_dir).unwrap();

        let mut config = make_config(&ref_dir, out.path(), "unused.fq");
        let reads = "@r1\nACGTACGT\n+\nIIIIIIII\n";
        fs::write(work_dir.join("sample1.fastq"), reads).unwrap();
        config.inputs.fastq = work_dir.join("sample1.fastq");
        let reference_before = fs::read(&config.inputs.reference).unwrap();

        let staged = stage_inputs(&config).unwrap();

        assert_eq!(staged.inputs.fastq, work_dir.join("sample1.fastq"));
        assert_eq!(fs::read_to_string(&staged.inputs.fastq).unwrap(), reads);
        assert_eq!(staged.inputs.reference, ref_dir.join("dm6.fa"));
        assert_eq!(fs::read(&staged.inputs.reference).unwrap(), reference_before);
    }

    #[test]
    fn missing_source_is_a_staging_error() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        // reads file never written
        let config = make_config(src.path(), out.path(), "reads.fq");

        let err = stage_inputs(&config).unwrap_err();
        assert!(matches!(err, Error::Staging(_)));
        assert!(err.to_string().contains("reads.fq"));
    }
}
