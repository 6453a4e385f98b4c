//! Favorites Manager for charrank.
//!
//! Keeps the set of favorite creator ids and a creator id -> nickname cache.
//! Both are persisted immediately after each change.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use crate::database::KeyValueStore;
use crate::types::character::CharacterRecord;
use crate::types::errors::FavoritesError;

/// Storage key of the favorite creator id list.
pub const FAVORITES_KEY: &str = "favoriteCreators";
/// Storage key of the creator nickname cache.
pub const CREATOR_NAMES_KEY: &str = "creatorNames";

/// A favorite creator as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteCreator {
    pub id: String,
    pub nickname: Option<String>,
}

/// Trait defining favorite creator operations.
pub trait FavoritesManagerTrait {
    fn toggle(&mut self, creator_id: &str) -> Result<bool, FavoritesError>;
    fn is_favorite(&self, creator_id: &str) -> bool;
    fn list(&self) -> Vec<FavoriteCreator>;
    fn remember_creators(&mut self, records: &[CharacterRecord]) -> Result<usize, FavoritesError>;
    fn nickname(&self, creator_id: &str) -> Option<&str>;
}

/// Favorites store backed by an injected key-value store.
pub struct FavoritesManager {
    store: Arc<dyn KeyValueStore>,
    favorites: BTreeSet<String>,
    names: BTreeMap<String, String>,
}

impl FavoritesManager {
    /// Hydrates favorites and the nickname cache from `store`.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, FavoritesError> {
        let favorites = match store.get(FAVORITES_KEY)? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| FavoritesError::Corrupt(e.to_string()))?,
            None => BTreeSet::new(),
        };
        let names = match store.get(CREATOR_NAMES_KEY)? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| FavoritesError::Corrupt(e.to_string()))?,
            None => BTreeMap::new(),
        };
        Ok(Self {
            store,
            favorites,
            names,
        })
    }

    fn persist_favorites(&self, favorites: &BTreeSet<String>) -> Result<(), FavoritesError> {
        let value = serde_json::to_value(favorites)?;
        self.store.set(FAVORITES_KEY, &value)?;
        Ok(())
    }

    fn persist_names(&self, names: &BTreeMap<String, String>) -> Result<(), FavoritesError> {
        let value = serde_json::to_value(names)?;
        self.store.set(CREATOR_NAMES_KEY, &value)?;
        Ok(())
    }
}

impl FavoritesManagerTrait for FavoritesManager {
    /// Flips the favorite state of a creator. Returns the new state.
    fn toggle(&mut self, creator_id: &str) -> Result<bool, FavoritesError> {
        let creator_id = creator_id.trim();
        if creator_id.is_empty() {
            return Err(FavoritesError::InvalidCreatorId(creator_id.to_string()));
        }

        let mut next = self.favorites.clone();
        let now_favorite = if next.remove(creator_id) {
            false
        } else {
            next.insert(creator_id.to_string());
            true
        };
        self.persist_favorites(&next)?;
        self.favorites = next;
        Ok(now_favorite)
    }

    fn is_favorite(&self, creator_id: &str) -> bool {
        self.favorites.contains(creator_id)
    }

    fn list(&self) -> Vec<FavoriteCreator> {
        self.favorites
            .iter()
            .map(|id| FavoriteCreator {
                id: id.clone(),
                nickname: self.names.get(id).cloned(),
            })
            .collect()
    }

    /// Updates the nickname cache from a ranking. Returns how many entries changed;
    /// storage is only written when something changed.
    fn remember_creators(&mut self, records: &[CharacterRecord]) -> Result<usize, FavoritesError> {
        let mut next = self.names.clone();
        let mut changed = 0;
        for record in records {
            let (Some(id), nickname) = (&record.creator.id, &record.creator.nickname) else {
                continue;
            };
            if nickname.is_empty() {
                continue;
            }
            if next.get(id) != Some(nickname) {
                next.insert(id.clone(), nickname.clone());
                changed += 1;
            }
        }
        if changed > 0 {
            self.persist_names(&next)?;
            self.names = next;
        }
        Ok(changed)
    }

    fn nickname(&self, creator_id: &str) -> Option<&str> {
        self.names.get(creator_id).map(String::as_str)
    }
}
