//! Locating the application root inside an extracted archive.

use std::collections::VecDeque;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// How the application root was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateMethod {
    /// Parent directory of the entry point executable.
    EntryPoint,
    /// No entry point found; the only top-level directory.
    SingleSubdirectory,
    /// No entry point found; the extraction root itself.
    ExtractionRoot,
}

/// Directory whose contents replace the installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRoot {
    pub path: PathBuf,
    pub method: LocateMethod,
}

fn sorted_entries(dir: &Path) -> Vec<fs::DirEntry> {
    let mut entries: Vec<_> = match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(std::result::Result::ok).collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping unreadable directory: {:?}", dir);
            return Vec::new();
        }
    };
    entries.sort_by_key(fs::DirEntry::file_name);
    entries
}

/// Windows file names compare without regard to ASCII case.
const CASE_INSENSITIVE_NAMES: bool = cfg!(windows);

fn is_entry_point_name(name: &OsStr, entry_point: &str, ignore_case: bool) -> bool {
    if ignore_case {
        name.to_str()
            .is_some_and(|name| name.eq_ignore_ascii_case(entry_point))
    } else {
        name == entry_point
    }
}

/// Breadth-first search for a file named `entry_point`; the shallowest match
/// wins, ties broken by name.
fn find_entry_point(root: &Path, entry_point: &str) -> Option<PathBuf> {
    let mut queue = VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = queue.pop_front() {
        let entries = sorted_entries(&dir);
        if let Some(found) = entries.iter().find(|entry| {
            is_entry_point_name(&entry.file_name(), entry_point, CASE_INSENSITIVE_NAMES)
                && entry.file_type().is_ok_and(|t| t.is_file())
        }) {
            return Some(found.path());
        }
        queue.extend(
            entries
                .iter()
                .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
                .map(fs::DirEntry::path),
        );
    }
    None
}

/// Picks the directory holding the new application.
///
/// Never fails: without an entry point the single top-level directory is
/// used, and failing that the extraction root. Fallbacks are logged.
pub fn locate_app_root(extraction_root: &Path, entry_point: &str) -> AppRoot {
    if let Some(path) = find_entry_point(extraction_root, entry_point)
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        tracing::info!("App files in: {:?}", path);
        return AppRoot {
            path,
            method: LocateMethod::EntryPoint,
        };
    }

    let subdirs: Vec<PathBuf> = sorted_entries(extraction_root)
        .into_iter()
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .map(|entry| entry.path())
        .collect();

    let root = match <[PathBuf; 1]>::try_from(subdirs) {
        Ok([only]) => AppRoot {
            path: only,
            method: LocateMethod::SingleSubdirectory,
        },
        Err(_) => AppRoot {
            path: extraction_root.to_path_buf(),
            method: LocateMethod::ExtractionRoot,
        },
    };
    tracing::warn!(
        entry_point,
        method = ?root.method,
        "Entry point not found in update, using {:?}",
        root.path
    );
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_entry_point_parent_is_root() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("app/bin/main"));
        touch(&temp.path().join("app/lib/libfoo.so"));

        let root = locate_app_root(temp.path(), "main");
        assert_eq!(root.path, temp.path().join("app/bin"));
        assert_eq!(root.method, LocateMethod::EntryPoint);
    }

    #[test]
    fn test_entry_point_name_case() {
        let upper = OsStr::new("MAIN.EXE");
        assert!(is_entry_point_name(upper, "main.exe", true));
        assert!(!is_entry_point_name(upper, "main.exe", false));
        assert!(is_entry_point_name(OsStr::new("main.exe"), "main.exe", false));
        assert!(!is_entry_point_name(OsStr::new("main.exe.bak"), "main.exe", true));
    }

    #[cfg(windows)]
    #[test]
    fn test_upper_case_entry_point_found_on_windows() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("app/MAIN.EXE"));
        touch(&temp.path().join("other/readme.txt"));

        let root = locate_app_root(temp.path(), "main.exe");
        assert_eq!(root.path, temp.path().join("app"));
        assert_eq!(root.method, LocateMethod::EntryPoint);
    }

    #[test]
    fn test_shallowest_match_wins() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("a/b/c/main.exe"));
        touch(&temp.path().join("z/main.exe"));

        let root = locate_app_root(temp.path(), "main.exe");
        assert_eq!(root.path, temp.path().join("z"));
    }

    #[test]
    fn test_ties_broken_by_name() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("beta/main"));
        touch(&temp.path().join("alpha/main"));

        let root = locate_app_root(temp.path(), "main");
        assert_eq!(root.path, temp.path().join("alpha"));
    }

    #[test]
    fn test_directory_named_like_entry_point_is_ignored() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("main")).unwrap();
        touch(&temp.path().join("pkg/main"));

        let root = locate_app_root(temp.path(), "main");
        assert_eq!(root.path, temp.path().join("pkg"));
    }

    #[test]
    fn test_single_subdirectory_fallback() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("only_dir/readme.txt"));
        touch(&temp.path().join("top.txt"));

        let root = locate_app_root(temp.path(), "main");
        assert_eq!(root.path, temp.path().join("only_dir"));
        assert_eq!(root.method, LocateMethod::SingleSubdirectory);
    }

    #[test]
    fn test_extraction_root_fallback() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("one")).unwrap();
        fs::create_dir_all(temp.path().join("two")).unwrap();

        let root = locate_app_root(temp.path(), "main");
        assert_eq!(root.path, temp.path());
        assert_eq!(root.method, LocateMethod::ExtractionRoot);

        let empty = tempfile::tempdir().unwrap();
        assert_eq!(
            locate_app_root(empty.path(), "main").method,
            LocateMethod::ExtractionRoot
        );
    }
}
