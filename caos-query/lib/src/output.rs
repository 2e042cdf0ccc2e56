//! Writing rendered artifacts to disk.
//!
//! Every artifact is rendered before anything is written. Writing then
//! happens in two phases: each file is staged next to its destination as
//! `<name>.tmp`, and only once all six are staged are they renamed into
//! place. A failure while staging removes the staged files and leaves any
//! previous outputs untouched.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::emit::RenderedArtifact;
use crate::error::{QueryGenError, Result};

/// Writes every artifact into `output_dir`, all or nothing.
///
/// Returns the final paths in the order of `artifacts`.
pub fn write_artifacts(output_dir: &Path, artifacts: &[RenderedArtifact]) -> Result<Vec<PathBuf>> {
    create_dir(output_dir)?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(artifacts.len());
    for rendered in artifacts {
        let path = output_dir.join(rendered.artifact.file_name());
        let temp_path = staging_path(&path);
        if let Err(e) = write_file(&temp_path, &rendered.content) {
            discard_staged(&staged);
            return Err(e);
        }
        debug!("Staged {}", temp_path.display());
        staged.push((temp_path, path));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (i, (temp_path, path)) in staged.iter().enumerate() {
        if let Err(e) = rename(temp_path, path) {
            discard_staged(&staged[i..]);
            return Err(e);
        }
        info!("Generated: {}", path.display());
        written.push(path.clone());
    }

    Ok(written)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (temp_path, _) in staged {
        if let Err(e) = fs::remove_file(temp_path) {
            warn!("Could not remove {}: {e}", temp_path.display());
        }
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| QueryGenError::Write {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|source| QueryGenError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|source| QueryGenError::Write {
        path: to.to_path_buf(),
        source,
    })
}
