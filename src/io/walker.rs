use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into.
pub const DEFAULT_SKIPPED_DIRS: [&str; 7] = [
    ".git",
    ".venv",
    "venv",
    "__pycache__",
    "node_modules",
    ".tox",
    ".mypy_cache",
];

pub struct FileWalker {
    root: PathBuf,
    skipped_dirs: Vec<String>,
    include_hidden: bool,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            skipped_dirs: DEFAULT_SKIPPED_DIRS.iter().map(|d| d.to_string()).collect(),
            include_hidden: false,
        }
    }

    pub fn with_skipped_dirs(mut self, dirs: Vec<String>) -> Self {
        self.skipped_dirs.extend(dirs);
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Python files under the root, sorted. A root that is itself a file is
    /// returned as-is.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_skipped(entry));

        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && is_python_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn is_skipped(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        if !self.include_hidden && name.starts_with('.') && entry.file_type().is_dir() {
            return true;
        }
        entry.file_type().is_dir() && self.skipped_dirs.iter().any(|d| *d == name)
    }
}

pub fn is_python_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py" || ext == "pyi")
}

pub fn find_python_files(root: &Path) -> Result<Vec<PathBuf>> {
    FileWalker::new(root.to_path_buf()).walk()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_finds_python_and_skips_caches() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::create_dir_all(root.join("__pycache__")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("pkg/b.py"), "x = 1\n").unwrap();
        fs::write(root.join("a.py"), "x = 1\n").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("__pycache__/a.py"), "").unwrap();
        fs::write(root.join(".hidden/c.py"), "").unwrap();

        let files = find_python_files(root).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(relative, vec![PathBuf::from("a.py"), PathBuf::from("pkg/b.py")]);
    }

    #[test]
    fn test_single_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("only.py");
        fs::write(&file, "").unwrap();
        assert_eq!(find_python_files(&file).unwrap(), vec![file]);
    }
}
