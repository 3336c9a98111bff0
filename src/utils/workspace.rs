use std::fs;
use std::path::Path;

use log::info;

use crate::config::defs::{PipelineError, STAGE_DIRS};

/// Creates the workspace root and one subdirectory per external tool.
///
/// Safe to call on a partially-existing tree: directories already present are
/// left untouched. A path collision with a non-directory file surfaces as the
/// underlying create error.
///
/// # Arguments
///
/// * `root` - Workspace root for this run.
///
/// # Returns
/// Result<(), PipelineError>
pub fn ensure_layout(root: &Path) -> Result<(), PipelineError> {
    let mut dirs = vec![root.to_path_buf()];
    dirs.extend(STAGE_DIRS.iter().map(|d| root.join(d)));

    for dir in dirs {
        if dir.is_dir() {
            continue;
        }
        info!("Creating directory {}...", dir.display());
        fs::create_dir(&dir).map_err(|source| PipelineError::Workspace {
            path: dir.clone(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defs::{FASTQC_DIR, PROKKA_DIR, QUAST_DIR, SPADES_DIR};
    use tempfile::tempdir;

    #[test]
    fn creates_full_layout() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("FASTASTIC");

        ensure_layout(&root).unwrap();

        for dir in [SPADES_DIR, FASTQC_DIR, QUAST_DIR, PROKKA_DIR] {
            assert!(root.join(dir).is_dir(), "missing {}", dir);
        }
    }

    #[test]
    fn is_idempotent() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("FASTASTIC");

        ensure_layout(&root).unwrap();
        ensure_layout(&root).unwrap();

        assert!(root.join(SPADES_DIR).is_dir());
    }

    #[test]
    fn fills_in_a_partial_tree() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("FASTASTIC");
        fs::create_dir_all(root.join(SPADES_DIR)).unwrap();

        ensure_layout(&root).unwrap();

        assert!(root.join(QUAST_DIR).is_dir());
    }

    #[test]
    fn file_collision_is_an_error() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("FASTASTIC");
        fs::create_dir(&root).unwrap();
        fs::write(root.join(SPADES_DIR), b"not a directory").unwrap();

        let err = ensure_layout(&root).unwrap_err();
        assert!(matches!(err, PipelineError::Workspace { .. }));
    }
}
