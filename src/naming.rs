//! File-name conventions shared by staging, index building and the stage
//! argument vectors.

use std::path::{Path, PathBuf};

/// Base name of `path` with a trailing `.gz` and then the last extension
/// removed: `/data/reads.fastq.gz` -> `reads`, `dm6.fa.masked` -> `dm6.fa`.
///
/// A name without any extension is returned unchanged.
pub fn base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => name.to_string(),
    }
}

/// `path` with its last extension removed, keeping the directory.
///
/// This is the index prefix the stage scripts expect next to each staged
/// FASTA file.
pub fn strip_extension(path: &Path) -> PathBuf {
    path.with_extension("")
}

/// Whether `name` can be used verbatim as a single file name.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains(std::path::MAIN_SEPARATOR)
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_drops_gz_then_extension() {
        assert_eq!(base_name(Path::new("/data/reads.fastq.gz")), "reads");
        assert_eq!(base_name(Path::new("/data/reads.fq")), "reads");
        assert_eq!(base_name(Path::new("dm6.fa.masked")), "dm6.fa");
        assert_eq!(base_name(Path::new("consensus.fasta")), "consensus");
    }

    #[test]
    fn base_name_without_extension() {
        assert_eq!(base_name(Path::new("/data/reads")), "reads");
        assert_eq!(base_name(Path::new("reads.gz")), "reads");
    }

    #[test]
    fn strip_extension_keeps_directory() {
        assert_eq!(
            strip_extension(Path::new("/out/reference/dm6.fa")),
            PathBuf::from("/out/reference/dm6")
        );
        assert_eq!(
            strip_extension(Path::new("/out/reference/masked.dm6.fa")),
            PathBuf::from("/out/reference/masked.dm6")
        );
        assert_eq!(
            strip_extension(Path::new("/out/reference/gem")),
            PathBuf::from("/out/reference/gem")
        );
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("2L"));
        assert!(is_plain_file_name("chrX_random"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("a/b"));
    }
}
