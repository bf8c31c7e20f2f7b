use super::WsfmtConfig;
use crate::errors::{Result, WsfmtError};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".wsfmt.toml";
const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<WsfmtConfig> {
    let config = toml::from_str::<WsfmtConfig>(contents)
        .map_err(|e| WsfmtError::Config(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e)))?;
    if config.analyzers.max_line_length == 0 {
        return Err(WsfmtError::Config(
            "analyzers.max_line_length must be greater than zero".to_string(),
        ));
    }
    Ok(config)
}

/// `start` followed by its parents, at most `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

fn try_load_config_from_path(config_path: &Path) -> Option<WsfmtConfig> {
    let contents = match std::fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            // Missing files are the common case
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
            }
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            tracing::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// Find the nearest `.wsfmt.toml` at or above `start_dir`.
///
/// Unreadable or invalid files are skipped with a warning.
pub fn load_config(start_dir: &Path) -> WsfmtConfig {
    directory_ancestors(start_dir.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            tracing::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            WsfmtConfig::default()
        })
}
