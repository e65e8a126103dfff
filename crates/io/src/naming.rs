// File naming for renamed candidates: `{prefix}{Title_With_Underscores}.{ext}`

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::IoError;
use crate::files::CandidateFile;

/// Conservative file-name form of a title: ASCII letters, digits, space,
/// `_`, `-`, `(` and `)` are kept, everything else dropped, and whitespace
/// runs become a single `_`. No truncation.
pub fn safe_file_stem(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '_' | '-' | '(' | ')'))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

/// `path` itself when free, otherwise the first of `name_1.ext`,
/// `name_2.ext`, ... that does not exist.
pub fn unique_path(path: &Path) -> PathBuf {
    first_free(path, |p| p.exists())
}

fn first_free(path: &Path, taken: impl Fn(&Path) -> bool) -> PathBuf {
    if !taken(path) {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let mut n = 1u32;
    loop {
        let candidate = parent.join(format!("{stem}_{n}{ext}"));
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Where a candidate lands when named after `title`; `None` when the title
/// has no usable characters. Keeps the candidate's extension.
pub fn titled_path(dir: &Path, prefix: &str, title: &str, file: &CandidateFile) -> Option<PathBuf> {
    let stem = safe_file_stem(title);
    if stem.is_empty() {
        return None;
    }
    let name = match file.path.extension() {
        Some(ext) => format!("{prefix}{stem}.{}", ext.to_string_lossy()),
        None => format!("{prefix}{stem}"),
    };
    Some(dir.join(name))
}

/// Copy `file` into `dir` under its title, never overwriting.
/// Returns the path written.
pub fn copy_titled(
    dir: &Path,
    prefix: &str,
    title: &str,
    file: &CandidateFile,
) -> Result<Option<PathBuf>, IoError> {
    let Some(base) = titled_path(dir, prefix, title, file) else {
        log::warn!("{}: title {title:?} gives an empty file name", file.file_name);
        return Ok(None);
    };
    std::fs::create_dir_all(dir).map_err(|e| IoError::write(dir, e))?;
    let target = unique_path(&base);
    if target != base {
        log::warn!(
            "name collision: {} -> {}",
            base.display(),
            target.display()
        );
    }
    std::fs::copy(&file.path, &target).map_err(|e| IoError::write(&target, e))?;
    log::debug!("{} -> {}", file.path.display(), target.display());
    Ok(Some(target))
}

/// The path `copy_titled` would write, without touching the disk.
/// `claimed` holds the targets of earlier copies in the same run and
/// receives this one.
pub fn plan_titled(
    dir: &Path,
    prefix: &str,
    title: &str,
    file: &CandidateFile,
    claimed: &mut HashSet<PathBuf>,
) -> Option<PathBuf> {
    let base = titled_path(dir, prefix, title, file)?;
    let target = first_free(&base, |p| p.exists() || claimed.contains(p));
    claimed.insert(target.clone());
    Some(target)
}
