use std::path::{Path, PathBuf};

/// Resolves a possibly-relative path against an explicit base directory.
///
/// # Arguments
///
/// * `path` - Path as given on the command line.
/// * `base` - Directory that relative paths are anchored to.
///
/// # Returns
/// Absolute path.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
