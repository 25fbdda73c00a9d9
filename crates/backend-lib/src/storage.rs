// ============================
// inventory-backend-lib/src/storage.rs
// ============================
//! Storage abstraction with flat-file and in-memory implementations.
//!
//! The credential store owns user records exclusively; password hashes never
//! leave this layer except embedded in a [`UserRecord`], and the public
//! [`UserView`] conversion strips them.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use inventory_common::{Role, UserView};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::fs as tokio_fs;
use uuid::Uuid;

use crate::error::AppError;

/// Stored user identity record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Public view of this record, without the password hash
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Stored inventory item record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: Option<f64>,
    pub category: Option<String>,
    /// Owner reference, set at creation and never reassigned
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Trait for storage backends
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a new user. Fails with `DuplicateCredential` if the username
    /// or email is already taken; the check-and-reserve is atomic.
    async fn create_user(&self, user: UserRecord) -> Result<(), AppError>;

    /// Look up a user by email
    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    /// Look up a user by id
    async fn user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError>;

    /// Overwrite an existing user record. Identity fields are immutable, so
    /// this never touches the uniqueness indexes; it exists for password
    /// rehash-on-change.
    async fn update_user(&self, user: UserRecord) -> Result<(), AppError>;

    /// Persist a new item
    async fn insert_item(&self, item: ItemRecord) -> Result<(), AppError>;

    /// Fetch a single item
    async fn item(&self, id: Uuid) -> Result<Option<ItemRecord>, AppError>;

    /// List all items, newest first
    async fn list_items(&self) -> Result<Vec<ItemRecord>, AppError>;

    /// Overwrite an existing item
    async fn update_item(&self, item: ItemRecord) -> Result<(), AppError>;

    /// Remove an item
    async fn delete_item(&self, id: Uuid) -> Result<(), AppError>;

    /// Liveness probe, health-check path only
    async fn ping(&self) -> Result<(), AppError>;
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Flat-file implementation of the Store trait.
///
/// One JSON document per record under `users/` and `items/`, with in-memory
/// uniqueness indexes rebuilt from disk at open.
pub struct FlatFileStore {
    root: PathBuf,
    by_email: DashMap<String, Uuid>,
    by_username: DashMap<String, Uuid>,
}

impl FlatFileStore {
    pub fn open<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("users"))?;
        fs::create_dir_all(root.join("items"))?;

        let store = Self {
            root,
            by_email: DashMap::new(),
            by_username: DashMap::new(),
        };

        // rebuild the uniqueness indexes from whatever is on disk
        for entry in fs::read_dir(store.root.join("users"))? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            let user: UserRecord = serde_json::from_str(&content)?;
            store.by_email.insert(normalize_email(&user.email), user.id);
            store.by_username.insert(user.username.clone(), user.id);
        }

        Ok(store)
    }

    fn user_path(&self, id: Uuid) -> PathBuf {
        self.root.join("users").join(format!("{id}.json"))
    }

    fn item_path(&self, id: Uuid) -> PathBuf {
        self.root.join("items").join(format!("{id}.json"))
    }

    /// Reserve both uniqueness indexes atomically, rolling back the first
    /// on a clash in the second.
    fn reserve_identity(&self, user: &UserRecord) -> Result<(), AppError> {
        let email_key = normalize_email(&user.email);
        match self.by_email.entry(email_key.clone()) {
            Entry::Occupied(_) => return Err(AppError::DuplicateCredential("email".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            },
        }
        match self.by_username.entry(user.username.clone()) {
            Entry::Occupied(_) => {
                self.by_email.remove(&email_key);
                return Err(AppError::DuplicateCredential("username".to_string()));
            },
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            },
        }
        Ok(())
    }

    fn release_identity(&self, user: &UserRecord) {
        self.by_email.remove(&normalize_email(&user.email));
        self.by_username.remove(&user.username);
    }
}

#[async_trait]
impl Store for FlatFileStore {
    async fn create_user(&self, user: UserRecord) -> Result<(), AppError> {
        self.reserve_identity(&user)?;

        let json = serde_json::to_string_pretty(&user)?;
        if let Err(err) = tokio_fs::write(self.user_path(user.id), json).await {
            self.release_identity(&user);
            return Err(err.into());
        }
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let Some(id) = self.by_email.get(&normalize_email(email)).map(|e| *e) else {
            return Ok(None);
        };
        self.user_by_id(id).await
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError> {
        let path = self.user_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio_fs::read_to_string(&path).await?;
        let user: UserRecord = serde_json::from_str(&content)?;
        Ok(Some(user))
    }

    async fn update_user(&self, user: UserRecord) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(&user)?;
        tokio_fs::write(self.user_path(user.id), json).await?;
        Ok(())
    }

    async fn insert_item(&self, item: ItemRecord) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(&item)?;
        tokio_fs::write(self.item_path(item.id), json).await?;
        Ok(())
    }

    async fn item(&self, id: Uuid) -> Result<Option<ItemRecord>, AppError> {
        let path = self.item_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio_fs::read_to_string(&path).await?;
        let item: ItemRecord = serde_json::from_str(&content)?;
        Ok(Some(item))
    }

    async fn list_items(&self) -> Result<Vec<ItemRecord>, AppError> {
        let mut items = Vec::new();
        let mut entries = tokio_fs::read_dir(self.root.join("items")).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let content = tokio_fs::read_to_string(&path).await?;
            let item: ItemRecord = serde_json::from_str(&content)?;
            items.push(item);
        }
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update_item(&self, item: ItemRecord) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(&item)?;
        tokio_fs::write(self.item_path(item.id), json).await?;
        Ok(())
    }

    async fn delete_item(&self, id: Uuid) -> Result<(), AppError> {
        let path = self.item_path(id);
        if path.exists() {
            tokio_fs::remove_file(path).await?;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        tokio_fs::metadata(self.root.join("items"))
            .await
            .map_err(|err| AppError::ConnectionUnavailable(err.to_string()))?;
        Ok(())
    }
}

/// In-memory implementation backed by dashmaps. Used by tests and as a
/// zero-setup dev backend.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, UserRecord>,
    by_email: DashMap<String, Uuid>,
    by_username: DashMap<String, Uuid>,
    items: DashMap<Uuid, ItemRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: UserRecord) -> Result<(), AppError> {
        let email_key = normalize_email(&user.email);
        match self.by_email.entry(email_key.clone()) {
            Entry::Occupied(_) => return Err(AppError::DuplicateCredential("email".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            },
        }
        match self.by_username.entry(user.username.clone()) {
            Entry::Occupied(_) => {
                self.by_email.remove(&email_key);
                return Err(AppError::DuplicateCredential("username".to_string()));
            },
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            },
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let Some(id) = self.by_email.get(&normalize_email(email)).map(|e| *e) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn update_user(&self, user: UserRecord) -> Result<(), AppError> {
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn insert_item(&self, item: ItemRecord) -> Result<(), AppError> {
        self.items.insert(item.id, item);
        Ok(())
    }

    async fn item(&self, id: Uuid) -> Result<Option<ItemRecord>, AppError> {
        Ok(self.items.get(&id).map(|i| i.clone()))
    }

    async fn list_items(&self) -> Result<Vec<ItemRecord>, AppError> {
        let mut items: Vec<ItemRecord> =
            self.items.iter().map(|entry| entry.value().clone()).collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update_item(&self, item: ItemRecord) -> Result<(), AppError> {
        self.items.insert(item.id, item);
        Ok(())
    }

    async fn delete_item(&self, id: Uuid) -> Result<(), AppError> {
        self.items.remove(&id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
