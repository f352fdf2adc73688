use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot create state directory {path:?}: {source}")]
    StateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Replaces `target` with `content` through a temp file in the same directory.
/// A crash leaves either the previous file or the new one, never a mix.
pub(crate) fn replace_file(target: &Path, content: &str) -> Result<(), PersistError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|source| PersistError::StateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let write_error = |source: io::Error| PersistError::Write {
        path: target.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
    tmp.write_all(content.as_bytes()).map_err(write_error)?;
    tmp.as_file_mut().sync_all().map_err(write_error)?;
    tmp.persist(target).map_err(|err| write_error(err.error))?;
    Ok(())
}
