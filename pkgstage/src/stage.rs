//! Publishing a built package directory.
//!
//! [stage] never leaves a half-written publish directory behind: the copy is
//! made into a temporary sibling of the destination and only renamed into
//! place once it is complete.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::*;
use thiserror::Error;

/// Totals for a completed copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub files: u64,
    pub bytes: u64,
}

#[derive(Error, Debug)]
pub enum StageError {
    #[error("package directory `{}` does not exist", .0.display())]
    MissingSource(PathBuf),
    #[error("package path `{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("publish directory `{}` overlaps package directory `{}`", .dst.display(), .src.display())]
    Overlap { src: PathBuf, dst: PathBuf },
    #[error("failed to {op} `{}`: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StageError {
    fn io<'a>(op: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> StageError + 'a {
        move |source| StageError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Removes `path` and everything below it. A missing path is not an error.
/// Returns whether anything was removed.
pub fn remove_dir_if_present(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
        Ok(meta) if !meta.is_dir() => fs::remove_file(path)?,
        Ok(_) => match fs::remove_dir_all(path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            res => res?,
        },
    }

    Ok(true)
}

/// Recursively copies the contents of `src` into `dst`, creating `dst`.
/// Symbolic links are recreated as links on unix and followed elsewhere.
/// Errors name the entry that could not be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<StageReport, StageError> {
    let mut report = StageReport::default();
    copy_into(src, dst, &mut report)?;
    Ok(report)
}

fn copy_into(src: &Path, dst: &Path, report: &mut StageReport) -> Result<(), StageError> {
    fs::create_dir_all(dst).map_err(StageError::io("create", dst))?;

    for entry in fs::read_dir(src).map_err(StageError::io("read", src))? {
        let entry = entry.map_err(StageError::io("read", src))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(StageError::io("inspect", &from))?;

        if file_type.is_dir() {
            copy_into(&from, &to, report)?;
        } else if file_type.is_symlink() {
            copy_symlink(&from, &to, report)?;
        } else {
            report.bytes += fs::copy(&from, &to).map_err(StageError::io("copy", &from))?;
            report.files += 1;
        }
    }

    ok!()
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path, report: &mut StageReport) -> Result<(), StageError> {
    let target = fs::read_link(from).map_err(StageError::io("read link", from))?;
    std::os::unix::fs::symlink(target, to).map_err(StageError::io("copy link", from))?;
    report.files += 1;
    ok!()
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path, report: &mut StageReport) -> Result<(), StageError> {
    let meta = fs::metadata(from).map_err(StageError::io("inspect", from))?;
    if meta.is_dir() {
        copy_into(from, to, report)
    } else {
        report.bytes += fs::copy(from, to).map_err(StageError::io("copy", from))?;
        report.files += 1;
        ok!()
    }
}

/// Replaces `dst` with a recursive copy of `src`.
pub fn stage(src: &Path, dst: &Path) -> Result<StageReport, StageError> {
    match fs::metadata(src) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(StageError::NotADirectory(src.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(StageError::MissingSource(src.to_path_buf()))
        }
        Err(err) => return Err(StageError::io("inspect", src)(err)),
    }

    // A destination inside the source would be copied into itself, and a
    // source inside the destination would be deleted with it.
    if dst.starts_with(src) || src.starts_with(dst) {
        return Err(StageError::Overlap {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
        });
    }

    let parent = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(StageError::io("create", &parent))?;

    // Dropping `scratch` removes whatever is left of it on any early return.
    let scratch = tempfile::Builder::new()
        .prefix(".pkgstage-")
        .tempdir_in(&parent)
        .map_err(StageError::io("create a temporary directory in", &parent))?;
    let staged = scratch.path().join("pkg");

    debug!("copying `{}` into `{}`", src.display(), staged.display());
    let report = copy_dir_recursive(src, &staged)?;

    if remove_dir_if_present(dst).map_err(StageError::io("remove", dst))? {
        debug!("removed previous `{}`", dst.display());
    }
    fs::rename(&staged, dst).map_err(StageError::io("move staged package to", dst))?;

    Ok(report)
}
