#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reads the JSON game-data asset into the immutable bundle consumed by the world.

use std::{
    fs,
    path::{Path, PathBuf},
};

use ticket_defence_core::{DataError, GameData, GridDimensions};
use tracing::{debug, info};

/// Failure raised while loading a game-data asset.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The asset could not be read from disk.
    #[error("failed to read game data from {path}")]
    Io {
        /// Location of the asset.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The asset is not valid JSON or does not match the bundle layout.
    #[error("malformed game data: {0}")]
    Json(#[from] serde_json::Error),
    /// The asset parsed but describes an inconsistent bundle.
    #[error("invalid game data: {0}")]
    Invalid(#[from] DataError),
}

/// Loads and validates the asset stored at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<GameData, LoadError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading game data");
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_str(&contents)
}

/// Parses and validates an asset held in memory.
pub fn from_str(contents: &str) -> Result<GameData, LoadError> {
    let data: GameData = serde_json::from_str(contents)?;
    let dimensions = data.validate()?;
    log_summary(&data, dimensions);
    Ok(data)
}

fn log_summary(data: &GameData, dimensions: GridDimensions) {
    info!(
        rows = dimensions.rows(),
        columns = dimensions.columns(),
        tower_types = data.tower_types.len(),
        skills = data.skills.len(),
        enemy_types = data.enemy_types.len(),
        waves = data.waves.len(),
        "game data loaded"
    );
}
