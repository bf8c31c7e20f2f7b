use crate::errors::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

const SOURCE_EXTENSION: &str = "rs";
const BUILD_OUTPUT_DIR: &str = "target";
const MANIFEST_FILE_NAME: &str = "Cargo.toml";

/// Collects the Rust sources under one project root.
pub struct SourceWalker {
    root: PathBuf,
    skip_nested_packages: bool,
}

impl SourceWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            skip_nested_packages: false,
        }
    }

    /// Stop at directories with their own `Cargo.toml`; those belong to another package.
    pub fn skip_nested_packages(mut self, skip: bool) -> Self {
        self.skip_nested_packages = skip;
        self
    }

    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        let skip_nested = self.skip_nested_packages;

        let walker = WalkBuilder::new(&self.root)
            .git_ignore(true)
            .require_git(false)
            .filter_entry(move |entry| {
                let path = entry.path();
                if !entry.file_type().is_some_and(|ft| ft.is_dir()) || path == root {
                    return true;
                }
                if entry.file_name() == BUILD_OUTPUT_DIR {
                    return false;
                }
                !(skip_nested && path.join(MANIFEST_FILE_NAME).is_file())
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && is_source_file(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(SOURCE_EXTENSION)
}

pub fn find_source_files(root: &Path, skip_nested_packages: bool) -> Result<Vec<PathBuf>> {
    SourceWalker::new(root.to_path_buf())
        .skip_nested_packages(skip_nested_packages)
        .walk()
}
