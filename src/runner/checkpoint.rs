use std::path::PathBuf;

use crate::error::Error;

/// Whether a checkpoint expects a regular file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    File,
    Directory,
}

/// An output a stage is expected to leave behind.
///
/// Declared before the stage runs and verified right after it; existence is
/// the only postcondition, since the stages cannot be inspected otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineArtifact {
    pub stage: String,
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl PipelineArtifact {
    pub fn file(stage: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            stage: stage.into(),
            path: path.into(),
            kind: ArtifactKind::File,
        }
    }

    pub fn directory(stage: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            stage: stage.into(),
            path: path.into(),
            kind: ArtifactKind::Directory,
        }
    }

    /// Fail with [`Error::Checkpoint`] unless the artifact exists.
    pub fn verify(&self) -> Result<(), Error> {
        let present = match self.kind {
            ArtifactKind::File => self.path.is_file(),
            ArtifactKind::Directory => self.path.is_dir(),
        };

        if present {
            log::info!("[{}] checkpoint ok: {}", self.stage, self.path.display());
            Ok(())
        } else {
            log::error!(
                "{} failed...expected {} is missing",
                self.stage,
                self.path.display()
            );
            Err(Error::Checkpoint {
                stage: self.stage.clone(),
                path: self.path.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn present_file_passes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reads.fastq.uq.polyn");
        fs::write(&path, "").unwrap();
        assert!(PipelineArtifact::file("data_prep.sh", &path).verify().is_ok());
    }

    #[test]
    fn missing_file_names_the_stage() {
        let dir = TempDir::new().unwrap();
        let artifact = PipelineArtifact::file(
            "insert_pipeline.sh",
            dir.path().join("insertion/s_Inserts_Annotated.txt"),
        );
        let err = artifact.verify().unwrap_err();
        assert!(matches!(err, Error::Checkpoint { .. }));
        assert!(err.to_string().contains("insert_pipeline.sh"));
        assert!(err.to_string().contains("s_Inserts_Annotated.txt"));
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        assert!(PipelineArtifact::file("x", dir.path()).verify().is_err());
        assert!(PipelineArtifact::directory("x", dir.path()).verify().is_ok());
    }
}
