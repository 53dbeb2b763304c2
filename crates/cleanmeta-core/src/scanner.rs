use glob::Pattern;
use std::path::{self, Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

/// Document families, each with one modern archive-based target extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFamily {
    WordProcessing,
    Spreadsheet,
    Presentation,
}

impl DocumentFamily {
    pub fn target_extension(self) -> &'static str {
        match self {
            DocumentFamily::WordProcessing => "docx",
            DocumentFamily::Spreadsheet => "xlsx",
            DocumentFamily::Presentation => "pptx",
        }
    }
}

struct SupportedExtension {
    ext: &'static str,
    family: DocumentFamily,
    legacy: bool,
}

const fn supported(ext: &'static str, family: DocumentFamily, legacy: bool) -> SupportedExtension {
    SupportedExtension { ext, family, legacy }
}

/// Lower-case extensions recognized as office documents. `legacy` marks
/// single-stream binary formats that go through the converter first.
/// `pps` has no conversion mapping and is passed through unconverted.
static SUPPORTED_EXTENSIONS: &[SupportedExtension] = &[
    supported("doc", DocumentFamily::WordProcessing, true),
    supported("docx", DocumentFamily::WordProcessing, false),
    supported("docm", DocumentFamily::WordProcessing, false),
    supported("wps", DocumentFamily::WordProcessing, true),
    supported("et", DocumentFamily::Spreadsheet, true),
    supported("xlsx", DocumentFamily::Spreadsheet, false),
    supported("xls", DocumentFamily::Spreadsheet, true),
    supported("xlsm", DocumentFamily::Spreadsheet, false),
    supported("pps", DocumentFamily::Presentation, false),
    supported("ppt", DocumentFamily::Presentation, true),
    supported("pptx", DocumentFamily::Presentation, false),
    supported("pptm", DocumentFamily::Presentation, false),
    supported("dps", DocumentFamily::Presentation, true),
];

fn lookup(path: &Path) -> Option<(&'static SupportedExtension, String)> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .find(|s| s.ext == ext)
        .map(|s| (s, ext))
}

/// Case-insensitive membership test against the supported extension set.
pub fn is_office_file(path: &Path) -> bool {
    lookup(path).is_some()
}

/// Office writes `~$name.docx` owner files next to open documents.
fn is_owner_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("~$"))
        .unwrap_or(false)
}

/// One discovered input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    /// Lower-case, without the dot.
    pub extension: String,
    pub family: DocumentFamily,
    pub legacy: bool,
}

impl FileTask {
    pub fn from_path(path: &Path) -> Option<FileTask> {
        let (supported, extension) = lookup(path)?;
        Some(FileTask {
            path: path.to_path_buf(),
            extension,
            family: supported.family,
            legacy: supported.legacy,
        })
    }

    /// Where the converter should write the modern equivalent, `None` when
    /// the file is already archive-based.
    pub fn conversion_target(&self) -> Option<PathBuf> {
        if self.legacy {
            Some(self.path.with_extension(self.family.target_extension()))
        } else {
            None
        }
    }
}

/// Remove paths that live under other paths in the list.
pub fn non_overlapping_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for root in roots {
        if result.iter().any(|kept| root.starts_with(kept)) {
            continue;
        }
        result.retain(|kept| !kept.starts_with(&root));
        result.push(root);
    }

    result
}

/// Walk `roots` (files or directories) and collect every supported office
/// file as an absolute path. Inaccessible entries are logged and skipped.
/// The result is sorted and free of duplicates.
pub fn discover<P: AsRef<Path>>(roots: &[P], ignore_globs: &[String]) -> Vec<FileTask> {
    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();
    let ignored = |p: &Path| ignore_patterns.iter().any(|pattern| pattern.matches_path(p));

    let absolute_roots: Vec<PathBuf> = roots
        .iter()
        .filter_map(|root| match path::absolute(root.as_ref()) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Cannot resolve {}: {}", root.as_ref().display(), e);
                None
            }
        })
        .collect();

    let mut files: Vec<PathBuf> = Vec::new();

    for root in non_overlapping_roots(absolute_roots) {
        if let Err(e) = root.metadata() {
            error!("Cannot access {}: {}", root.display(), e);
            continue;
        }

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !ignored(entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !is_office_file(path) {
                continue;
            }
            if is_owner_file(path) {
                debug!("Skipping owner file {}", path.display());
                continue;
            }
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files.dedup();

    files.iter().filter_map(|p| FileTask::from_path(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert!(is_office_file(Path::new("report.DOCX")));
        assert!(is_office_file(Path::new("sheet.Xls")));
        assert!(is_office_file(Path::new("deck.pptm")));
        assert!(!is_office_file(Path::new("notes.txt")));
        assert!(!is_office_file(Path::new("report.docx.bak")));
        assert!(!is_office_file(Path::new("docx")));
    }

    #[test]
    fn test_conversion_targets() {
        let doc = FileTask::from_path(Path::new("/tmp/a.DOC")).unwrap();
        assert!(doc.legacy);
        assert_eq!(doc.extension, "doc");
        assert_eq!(doc.conversion_target(), Some(PathBuf::from("/tmp/a.docx")));

        let et = FileTask::from_path(Path::new("/tmp/b.et")).unwrap();
        assert_eq!(et.conversion_target(), Some(PathBuf::from("/tmp/b.xlsx")));

        let dps = FileTask::from_path(Path::new("/tmp/c.dps")).unwrap();
        assert_eq!(dps.conversion_target(), Some(PathBuf::from("/tmp/c.pptx")));

        let docx = FileTask::from_path(Path::new("/tmp/d.docx")).unwrap();
        assert_eq!(docx.conversion_target(), None);

        let pps = FileTask::from_path(Path::new("/tmp/e.pps")).unwrap();
        assert_eq!(pps.conversion_target(), None);
    }

    #[test]
    fn test_non_overlapping_with_subdirectory() {
        let roots = vec![
            PathBuf::from("/home/user/docs"),
            PathBuf::from("/home/user"),
            PathBuf::from("/var/data"),
            PathBuf::from("/home/user/docs/a.docx"),
        ];
        let result = non_overlapping_roots(roots);
        assert_eq!(result.len(), 2);
        assert!(result.contains(&PathBuf::from("/home/user")));
        assert!(result.contains(&PathBuf::from("/var/data")));
    }

    #[test]
    fn test_discover_filters_and_recurses() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("a.docx"), b"x").unwrap();
        fs::write(root.join("b.txt"), b"x").unwrap();
        fs::write(root.join("nested/C.XLSX"), b"x").unwrap();
        fs::write(root.join("nested/deeper/d.ppt"), b"x").unwrap();
        fs::write(root.join("nested/~$a.docx"), b"x").unwrap();

        let tasks = discover(&[root], &[]);
        let names: Vec<_> = tasks
            .iter()
            .map(|t| t.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(tasks.len(), 3, "got {:?}", names);
        assert!(names.contains(&"a.docx".to_string()));
        assert!(names.contains(&"C.XLSX".to_string()));
        assert!(names.contains(&"d.ppt".to_string()));
        assert!(tasks.iter().all(|t| t.path.is_absolute()));
    }

    #[test]
    fn test_discover_dedupes_overlapping_roots_and_explicit_files() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/a.docx"), b"x").unwrap();

        let roots = vec![root.join("sub"), root.to_path_buf(), root.join("sub/a.docx")];
        let tasks = discover(&roots, &[]);
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_discover_skips_missing_root_and_unsupported_file() {
        let tmp = tempdir().unwrap();
        let txt = tmp.path().join("b.txt");
        fs::write(&txt, b"x").unwrap();

        let roots = vec![tmp.path().join("does-not-exist"), txt];
        assert!(discover(&roots, &[]).is_empty());
    }

    #[test]
    fn test_discover_honors_ignore_patterns() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("archive")).unwrap();
        fs::write(root.join("keep.docx"), b"x").unwrap();
        fs::write(root.join("archive/old.docx"), b"x").unwrap();

        let tasks = discover(&[root], &["**/archive/**".to_string()]);
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].path.ends_with("keep.docx"));
    }
}
