//! Loading and saving the profile collection, including the one-time upgrade
//! from the older storage layouts.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::layout_engine::LayoutKind;
use crate::model::profile::{Group, Profile};
use crate::sys::storage::{Entries, Store, StoreError};

/// Key holding the whole profile collection.
pub const PROFILES_KEY: &str = "verticalProfilesV2";
/// Older layout: a bare list of groups with no profiles.
pub const LEGACY_GROUPS_KEY: &str = "verticalMailGroups";
/// Oldest layout: a bare list of URLs.
pub const LEGACY_URLS_KEY: &str = "verticalMailUrls";

pub const MIGRATED_PROFILE_NAME: &str = "Default";
pub const MIGRATED_GROUP_NAME: &str = "Mail";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("stored record under '{key}' is malformed: {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Where a freshly synthesized collection came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Migration {
    LegacyGroups,
    LegacyUrls,
    DefaultUrls,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub profiles: Vec<Profile>,
    pub migration: Option<Migration>,
    /// Set when the upgraded collection could not be written back. The
    /// collection is still usable; the next save retries the write.
    pub migration_write_error: Option<StoreError>,
}

pub struct Persistence<S> {
    store: S,
    default_urls: Vec<String>,
}

impl<S: Store> Persistence<S> {
    pub fn new(store: S, default_urls: Vec<String>) -> Self { Self { store, default_urls } }

    pub fn store(&self) -> &S { &self.store }

    pub fn store_mut(&mut self) -> &mut S { &mut self.store }

    pub fn load(&mut self) -> Result<LoadOutcome, PersistenceError> {
        let mut entries =
            self.store.get(&[PROFILES_KEY, LEGACY_GROUPS_KEY, LEGACY_URLS_KEY])?;

        let stored: Vec<Profile> = decode_list(&mut entries, PROFILES_KEY)?;
        if !stored.is_empty() {
            return Ok(LoadOutcome {
                profiles: stored,
                migration: None,
                migration_write_error: None,
            });
        }

        let (groups, migration) = self.migrate(&mut entries);
        let profiles = vec![Profile::with_groups(MIGRATED_PROFILE_NAME, groups)];
        info!(?migration, "synthesized profile collection");

        let migration_write_error = match self.write(&profiles) {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to persist migrated profiles: {e}");
                Some(e)
            }
        };

        Ok(LoadOutcome {
            profiles,
            migration: Some(migration),
            migration_write_error,
        })
    }

    pub fn save(&mut self, profiles: &[Profile]) -> Result<(), PersistenceError> {
        Ok(self.write(profiles)?)
    }

    fn write(&mut self, profiles: &[Profile]) -> Result<(), StoreError> {
        let value = serde_json::to_value(profiles).map_err(StoreError::from)?;
        self.store.set(Entries::from([(PROFILES_KEY.to_string(), value)]))
    }

    fn migrate(&self, entries: &mut Entries) -> (Vec<Group>, Migration) {
        let groups: Vec<Group> = decode_legacy_list(entries, LEGACY_GROUPS_KEY);
        if !groups.is_empty() {
            return (groups, Migration::LegacyGroups);
        }

        let urls: Vec<String> = decode_legacy_list(entries, LEGACY_URLS_KEY);
        let (urls, migration) = if urls.is_empty() {
            (self.default_urls.clone(), Migration::DefaultUrls)
        } else {
            (urls, Migration::LegacyUrls)
        };
        let mail = Group::new(MIGRATED_GROUP_NAME, LayoutKind::Vertical, urls);
        (vec![mail], migration)
    }
}

/// Decodes a list record; absent and `null` records decode as empty.
fn decode_list<T>(entries: &mut Entries, key: &'static str) -> Result<Vec<T>, PersistenceError>
where
    T: serde::de::DeserializeOwned,
{
    match entries.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value)
            .map_err(|source| PersistenceError::Malformed { key, source }),
    }
}

/// Legacy records only seed a migration; one that cannot be read is skipped.
fn decode_legacy_list<T>(entries: &mut Entries, key: &'static str) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    decode_list(entries, key).unwrap_or_else(|e| {
        warn!("Ignoring legacy record: {e}");
        Vec::new()
    })
}
