// Candidate file discovery

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::IoError;

/// A file on disk whose name is matched against the reference titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub file_name: String,
    /// File name without its last extension.
    pub stem: String,
}

impl CandidateFile {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&file_name)
            .to_string();
        Some(Self {
            path,
            file_name,
            stem,
        })
    }
}

/// List files under `dir` whose extension is one of `extensions`
/// (case-insensitive, leading dot optional); an empty list takes every file.
/// Hidden files are skipped.
/// Sorted by file name, then path.
pub fn list_candidates(
    dir: &Path,
    extensions: &[String],
    recursive: bool,
) -> Result<Vec<CandidateFile>, IoError> {
    if !dir.is_dir() {
        return Err(IoError::read(dir, "not a directory"));
    }
    let wanted: Vec<String> = extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {e}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let Some(file) = CandidateFile::from_path(path.clone()) else {
            log::warn!("skipping {}: file name is not valid UTF-8", path.display());
            continue;
        };
        if file.file_name.starts_with('.') {
            continue;
        }
        let ext = file
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if wanted.is_empty() || wanted.contains(&ext) {
            files.push(file);
        } else {
            log::trace!("ignoring {}", file.path.display());
        }
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name).then_with(|| a.path.cmp(&b.path)));
    log::info!("found {} candidate files in {}", files.len(), dir.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b_paper.pdf", "A_paper.PDF", "notes.txt", ".hidden.pdf", "c.pdf.part"] {
            touch(&dir.path().join(name));
        }
        let files = list_candidates(dir.path(), &["pdf".into()], false).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["A_paper.PDF", "b_paper.pdf"]);
        assert_eq!(files[0].stem, "A_paper");
    }

    #[test]
    fn recursive_descends() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("top.pdf"));
        touch(&dir.path().join("2021/nested.pdf"));

        let flat = list_candidates(dir.path(), &["pdf".into()], false).unwrap();
        assert_eq!(flat.len(), 1);

        let deep = list_candidates(dir.path(), &[".PDF".into()], true).unwrap();
        let names: Vec<&str> = deep.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["nested.pdf", "top.pdf"]);
    }

    #[test]
    fn several_extensions() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("README.md"));
        touch(&dir.path().join("readme.txt"));
        touch(&dir.path().join("data.zip"));
        let files = list_candidates(dir.path(), &["md".into(), "txt".into()], false).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn no_extensions_takes_everything() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.pdf.txt"));
        touch(&dir.path().join("b"));
        touch(&dir.path().join(".DS_Store"));
        let files = list_candidates(dir.path(), &[], false).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn missing_dir_is_error() {
        let dir = tempdir().unwrap();
        let err = list_candidates(&dir.path().join("nope"), &["pdf".into()], false).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        touch(&dir.path().join("ok.pdf"));
        touch(&dir.path().join(OsStr::from_bytes(b"bad\xff.pdf")));
        let files = list_candidates(dir.path(), &["pdf".into()], false).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["ok.pdf"]);
    }

    #[test]
    fn stem_strips_last_extension_only() {
        let f = CandidateFile::from_path(PathBuf::from("x/ECMA_paper.tar.gz")).unwrap();
        assert_eq!(f.file_name, "ECMA_paper.tar.gz");
        assert_eq!(f.stem, "ECMA_paper.tar");
    }
}
