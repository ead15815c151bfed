use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::bounds::Coordinates;

/// Two favorites closer than this on both axes are the same place.
const DUPLICATE_TOLERANCE_DEGREES: f64 = 0.0001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteLocation {
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum FavoritesError {
    #[error("favorite with name '{0}' already exists")]
    DuplicateName(String),
    #[error("favorite at these coordinates already exists: '{existing}'")]
    DuplicateCoordinates { existing: String },
    #[error("no favorite found with name '{0}'")]
    NotFound(String),
    #[error("favorites file error: {0}")]
    Io(#[from] io::Error),
    #[error("favorites could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Named locations persisted as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    path: PathBuf,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing files load as empty; entries that do not match the schema are dropped.
    pub fn load(&self) -> Result<Vec<FavoriteLocation>, FavoritesError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&content) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(path = %self.path.display(), error = %error, "invalid favorites file; treating as empty");
                return Ok(Vec::new());
            }
        };

        let total = entries.len();
        let favorites: Vec<FavoriteLocation> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();
        if favorites.len() < total {
            warn!(
                path = %self.path.display(),
                dropped = total - favorites.len(),
                "dropped malformed favorites"
            );
        }
        Ok(favorites)
    }

    pub fn list(&self) -> Result<Vec<FavoriteLocation>, FavoritesError> {
        self.load()
    }

    pub fn add(
        &self,
        name: &str,
        address: &str,
        coordinates: Coordinates,
    ) -> Result<FavoriteLocation, FavoritesError> {
        let mut favorites = self.load()?;

        if favorites.iter().any(|fav| same_name(&fav.name, name)) {
            return Err(FavoritesError::DuplicateName(name.to_string()));
        }
        if let Some(existing) = favorites
            .iter()
            .find(|fav| fav.coordinates.is_near(&coordinates, DUPLICATE_TOLERANCE_DEGREES))
        {
            return Err(FavoritesError::DuplicateCoordinates {
                existing: existing.name.clone(),
            });
        }

        let favorite = FavoriteLocation {
            name: name.to_string(),
            address: address.to_string(),
            coordinates,
            date_added: Some(Utc::now()),
        };
        favorites.push(favorite.clone());
        self.save(&favorites)?;

        info!(name, address, "added favorite");
        Ok(favorite)
    }

    pub fn remove(&self, name: &str) -> Result<FavoriteLocation, FavoritesError> {
        let mut favorites = self.load()?;
        let position = favorites
            .iter()
            .position(|fav| same_name(&fav.name, name))
            .ok_or_else(|| FavoritesError::NotFound(name.to_string()))?;

        let removed = favorites.remove(position);
        self.save(&favorites)?;
        info!(name = %removed.name, "removed favorite");
        Ok(removed)
    }

    pub fn find(&self, name: &str) -> Result<Option<FavoriteLocation>, FavoritesError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|fav| same_name(&fav.name, name)))
    }

    /// Remove every favorite, returning how many were cleared.
    pub fn clear(&self) -> Result<usize, FavoritesError> {
        let count = self.load()?.len();
        if count > 0 {
            self.save(&[])?;
        }
        Ok(count)
    }

    fn save(&self, favorites: &[FavoriteLocation]) -> Result<(), FavoritesError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_string_pretty(favorites)?;
        fs::write(&self.path, encoded)?;
        Ok(())
    }
}

fn same_name(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
