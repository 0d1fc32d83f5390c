//! Production build staging.
//!
//! Produces `build.out_dir` from the configured entry pages and the public
//! directory:
//!
//! 1. Empty `out_dir` (when `build.empty_out_dir` is set).
//! 2. Copy each entry page to the same path relative to `out_dir`.
//! 3. Copy the public directory's contents verbatim into `out_dir`.
//!
//! Compiling the UI module and bundling scripts are done by the UI
//! toolchain before this step; this only lays out what the server would
//! serve.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::config::ShellConfig;

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A configured entry page does not exist.
    #[error("entry '{name}' not found at {path}")]
    MissingEntry { name: String, path: PathBuf },

    /// `out_dir` contains the project root; emptying it would delete sources.
    #[error("refusing to build into {0}: it contains the project root")]
    UnsafeOutDir(PathBuf),

    /// A file system operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a build wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// The output directory.
    pub out_dir: PathBuf,
    /// Entry pages written, relative to `out_dir`, in entry-name order.
    pub entries: Vec<PathBuf>,
    /// Number of files copied from the public directory.
    pub public_files: usize,
}

/// Runs the build described by `config`.
///
/// # Errors
///
/// [`BuildError`] on the first failure; `out_dir` may be partially written.
pub fn run_build(config: &ShellConfig) -> Result<BuildReport, BuildError> {
    let out_dir = config.out_dir();
    ensure_safe_out_dir(&config.root, &out_dir)?;

    // Check every entry before touching the output directory.
    let mut pages = Vec::with_capacity(config.entries.len());
    for (name, relative) in &config.entries {
        let source = config.root.join(relative);
        if !source.is_file() {
            return Err(BuildError::MissingEntry {
                name: name.clone(),
                path: source,
            });
        }
        pages.push((source, relative.clone()));
    }

    if config.build.empty_out_dir && out_dir.exists() {
        debug!("emptying {}", out_dir.display());
        fs::remove_dir_all(&out_dir).map_err(|source| io_error(&out_dir, source))?;
    }
    fs::create_dir_all(&out_dir).map_err(|source| io_error(&out_dir, source))?;

    let mut entries = Vec::with_capacity(pages.len());
    for (source, relative) in pages {
        copy_file(&source, &out_dir.join(&relative))?;
        entries.push(relative);
    }

    let public_dir = config.public_dir();
    let public_files = if public_dir.is_dir() {
        copy_tree(&public_dir, &out_dir)?
    } else {
        debug!("no public directory at {}", public_dir.display());
        0
    };

    info!(
        "build complete: {} entr{} and {} public file{} in {}",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" },
        public_files,
        if public_files == 1 { "" } else { "s" },
        out_dir.display()
    );

    Ok(BuildReport {
        out_dir,
        entries,
        public_files,
    })
}

fn ensure_safe_out_dir(root: &Path, out_dir: &Path) -> Result<(), BuildError> {
    // Compare canonical forms when both exist, lexical forms otherwise.
    let canonical = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
    if canonical(root).starts_with(canonical(out_dir)) {
        return Err(BuildError::UnsafeOutDir(out_dir.to_path_buf()));
    }
    Ok(())
}

fn copy_file(source: &Path, dest: &Path) -> Result<(), BuildError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    fs::copy(source, dest).map_err(|e| io_error(source, e))?;
    debug!("{} → {}", source.display(), dest.display());
    Ok(())
}

/// Recursively copies the contents of `from` into `to`; returns files copied.
fn copy_tree(from: &Path, to: &Path) -> Result<usize, BuildError> {
    let mut copied = 0;
    let read_dir = fs::read_dir(from).map_err(|e| io_error(from, e))?;
    for entry in read_dir {
        let entry = entry.map_err(|e| io_error(from, e))?;
        let path = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| io_error(&path, e))?;
        if file_type.is_dir() {
            copied += copy_tree(&path, &dest)?;
        } else {
            copy_file(&path, &dest)?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn io_error(path: &Path, source: std::io::Error) -> BuildError {
    BuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
