//! Include/exclude selection of formattable documents.
//!
//! Patterns are relative to the workspace directory. Each one is accepted
//! either as a glob (`src/**/*.rs`) or as a plain file/folder path, which
//! matches that file and everything below that folder. An empty include
//! list selects every document; an exclude match always wins.

use crate::errors::Result;
use glob::{MatchOptions, Pattern};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Number of leading lines searched for a generated-code marker.
const GENERATED_HEADER_LINES: usize = 10;

const GENERATED_MARKERS: &[&str] = &["@generated", "<auto-generated", "automatically generated"];

#[derive(Debug, Clone)]
struct PathPattern {
    prefix: PathBuf,
    glob: Option<Pattern>,
}

impl PathPattern {
    fn parse(base: &Path, raw: &str) -> Result<Self> {
        let trimmed = raw.trim_end_matches(['/', '\\']);
        let glob = if trimmed.contains(['*', '?', '[']) {
            Some(Pattern::new(&base.join(trimmed).to_string_lossy())?)
        } else {
            None
        };
        Ok(Self {
            prefix: base.join(trimmed),
            glob,
        })
    }

    fn matches(&self, path: &Path) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        match &self.glob {
            Some(glob) => glob.matches_path_with(path, options),
            None => path.starts_with(&self.prefix),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceFileMatcher {
    include: Vec<PathPattern>,
    exclude: Vec<PathPattern>,
}

impl SourceFileMatcher {
    pub fn new(base: &Path, include: &[String], exclude: &[String]) -> Result<Self> {
        let parse_all = |raw: &[String]| {
            raw.iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| PathPattern::parse(base, p))
                .collect::<Result<Vec<_>>>()
        };
        Ok(Self {
            include: parse_all(include)?,
            exclude: parse_all(exclude)?,
        })
    }

    /// Matcher that selects every path.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_match(&self, path: &Path) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(path));
        included && !self.exclude.iter().any(|p| p.matches(path))
    }
}

/// Whether a document is generated code and should be left alone by default.
pub fn is_generated(path: &Path) -> bool {
    is_generated_path(path) || has_generated_header(path)
}

fn is_generated_path(path: &Path) -> bool {
    let generated_dir = path
        .parent()
        .is_some_and(|dir| dir.components().any(|c| c.as_os_str() == "generated"));
    let generated_name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with("_generated") || stem.ends_with(".generated"));
    generated_dir || generated_name
}

fn has_generated_header(path: &Path) -> bool {
    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };
    BufReader::new(file)
        .lines()
        .take(GENERATED_HEADER_LINES)
        .map_while(|line| line.ok())
        .any(|line| {
            let lower = line.to_ascii_lowercase();
            GENERATED_MARKERS.iter().any(|marker| lower.contains(marker))
        })
}
