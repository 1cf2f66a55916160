//! Key/value persistence of the session: one JSON document per fixed key.
//!
//! The three documents are written together after every mutation. Backends
//! that have a transaction primitive make that write atomic; the file
//! backend only guarantees each key on its own.

mod file;
mod memory;
mod pg;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(test)]
pub use memory::FlakyStore;
pub use pg::PgStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::inbody::dto::InBodyData;
use crate::meals::dto::MealLog;
use crate::profile::dto::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Profile,
    BodyHistory,
    MealHistory,
}

impl StoreKey {
    pub const ALL: [StoreKey; 3] = [StoreKey::Profile, StoreKey::BodyHistory, StoreKey::MealHistory];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Profile => "diet_user",
            StoreKey::BodyHistory => "diet_inbody",
            StoreKey::MealHistory => "diet_meals",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error on {key}: {source}")]
    Io {
        key: StoreKey,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document under {key}: {source}")]
    Malformed {
        key: StoreKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: StoreKey) -> Result<Option<Value>, StoreError>;
    async fn save(&self, key: StoreKey, value: &Value) -> Result<(), StoreError>;
    async fn clear(&self, key: StoreKey) -> Result<(), StoreError>;

    /// Write several keys in one pass.
    async fn save_all(&self, entries: &[(StoreKey, Value)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.save(*key, value).await?;
        }
        Ok(())
    }
}

pub async fn connect(config: &StoreConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.backend {
        StoreBackend::File => {
            info!(dir = %config.dir.display(), "using file session store");
            Arc::new(FileStore::open(&config.dir).await?)
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
            info!("using postgres session store");
            Arc::new(PgStore::connect(url).await?)
        }
        StoreBackend::Memory => {
            info!("using in-memory session store");
            Arc::new(MemoryStore::default())
        }
    };
    Ok(store)
}

/// Persisted part of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub profile: UserProfile,
    pub body_history: Vec<InBodyData>,
    pub meal_history: Vec<MealLog>,
}

async fn load_key<T: DeserializeOwned + Default>(
    store: &dyn SessionStore,
    key: StoreKey,
) -> Result<T, StoreError> {
    match store.load(key).await? {
        Some(value) => serde_json::from_value(value).map_err(|source| StoreError::Malformed { key, source }),
        None => {
            debug!(%key, "key absent; using default");
            Ok(T::default())
        }
    }
}

fn to_value<T: Serialize>(key: StoreKey, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Malformed { key, source })
}

/// Read all three keys; absent keys yield the empty profile and empty histories.
pub async fn load_snapshot(store: &dyn SessionStore) -> Result<Snapshot, StoreError> {
    Ok(Snapshot {
        profile: load_key(store, StoreKey::Profile).await?,
        body_history: load_key(store, StoreKey::BodyHistory).await?,
        meal_history: load_key(store, StoreKey::MealHistory).await?,
    })
}

/// Write all three keys. Returns `false` without touching the store while the
/// profile has no patient id.
pub async fn persist_snapshot(
    store: &dyn SessionStore,
    profile: &UserProfile,
    body_history: &[InBodyData],
    meal_history: &[MealLog],
) -> Result<bool, StoreError> {
    if !profile.is_logged_in() {
        debug!("no patient id yet; skipping persist");
        return Ok(false);
    }
    let entries = [
        (StoreKey::Profile, to_value(StoreKey::Profile, profile)?),
        (StoreKey::BodyHistory, to_value(StoreKey::BodyHistory, &body_history)?),
        (StoreKey::MealHistory, to_value(StoreKey::MealHistory, &meal_history)?),
    ];
    store.save_all(&entries).await?;
    debug!(
        patient_id = %profile.patient_id,
        body_entries = body_history.len(),
        meals = meal_history.len(),
        "session persisted"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn entry(id: &str) -> InBodyData {
        InBodyData {
            id: id.into(),
            date: date!(2024 - 05 - 01),
            weight_kg: 63.4,
            body_fat_percent: Some(27.5),
            muscle_mass_kg: None,
            bmi: Some(22.1),
            visceral_fat_level: Some(7.0),
            score: None,
            is_manual: Some(true),
        }
    }

    fn patient() -> UserProfile {
        UserProfile {
            patient_id: "P-1".into(),
            name: "Hanako".into(),
            ..UserProfile::empty()
        }
    }

    #[tokio::test]
    async fn absent_keys_load_as_defaults() {
        let store = MemoryStore::default();
        let snap = load_snapshot(&store).await.unwrap();
        assert_eq!(snap, Snapshot::default());
        assert!(!snap.profile.is_logged_in());
    }

    #[tokio::test]
    async fn persist_is_skipped_before_login() {
        let store = MemoryStore::default();
        let written = persist_snapshot(&store, &UserProfile::empty(), &[entry("a")], &[])
            .await
            .unwrap();
        assert!(!written);
        for key in StoreKey::ALL {
            assert!(store.load(key).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn appended_entry_survives_round_trip() {
        let store = MemoryStore::default();
        let history = vec![entry("a")];
        persist_snapshot(&store, &patient(), &history, &[]).await.unwrap();

        let snap = load_snapshot(&store).await.unwrap();
        assert_eq!(snap.body_history, history);
        assert_eq!(snap.profile, patient());
    }

    #[tokio::test]
    async fn malformed_document_is_an_error() {
        let store = MemoryStore::default();
        store
            .save(StoreKey::MealHistory, &serde_json::json!({"not": "a list"}))
            .await
            .unwrap();
        let err = load_snapshot(&store).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { key: StoreKey::MealHistory, .. }));
    }

    #[tokio::test]
    async fn tolerates_missing_optional_fields() {
        let store = MemoryStore::default();
        store
            .save(
                StoreKey::BodyHistory,
                &serde_json::json!([{"id": "1700000000000", "date": "2024-01-02", "weightKg": 70.5}]),
            )
            .await
            .unwrap();
        store
            .save(StoreKey::Profile, &serde_json::json!({"patientId": "P-9", "name": "Ken"}))
            .await
            .unwrap();
        let snap = load_snapshot(&store).await.unwrap();
        assert_eq!(snap.body_history[0].weight_kg, 70.5);
        assert_eq!(snap.body_history[0].body_fat_percent, None);
        assert_eq!(snap.profile.patient_id, "P-9");
        assert_eq!(snap.profile.custom_targets, None);
    }

    #[tokio::test]
    async fn japanese_meal_categories_keep_their_meaning() {
        use crate::meals::dto::MealCategory;

        let store = MemoryStore::default();
        store
            .save(
                StoreKey::MealHistory,
                &serde_json::json!([
                    {"id": "1", "date": "2024-06-01", "time": "07:30", "category": "朝食", "description": "toast"},
                    {"id": "2", "date": "2024-06-01", "time": "12:10", "category": "昼食", "description": "soba"},
                    {"id": "3", "date": "2024-06-01", "time": "19:00", "category": "夕食", "description": "fish"},
                    {"id": "4", "date": "2024-06-01", "time": "15:00", "category": "間食", "description": "mochi"},
                    {"id": "5", "date": "2024-06-01", "time": "15:30", "category": "brunch", "description": "eggs"}
                ]),
            )
            .await
            .unwrap();
        let snap = load_snapshot(&store).await.unwrap();
        let categories: Vec<MealCategory> = snap.meal_history.iter().map(|m| m.category).collect();
        assert_eq!(
            categories,
            [
                MealCategory::Breakfast,
                MealCategory::Lunch,
                MealCategory::Dinner,
                MealCategory::Snack,
                MealCategory::Other
            ]
        );

        persist_snapshot(&store, &patient(), &[], &snap.meal_history).await.unwrap();
        let reloaded = load_snapshot(&store).await.unwrap();
        assert_eq!(reloaded.meal_history, snap.meal_history);
        let stored = store.load(StoreKey::MealHistory).await.unwrap().unwrap();
        assert_eq!(stored[0]["category"], "breakfast");
    }
}
