//! In-process storage backend.
//!
//! Used when no `DATABASE_URL` is configured and as the backend of the
//! end-to-end tests. Applies the same owner scoping, case-insensitive
//! matching, ordering and pagination rules as the PostgreSQL backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::protocol::{AccountItem, CardItem, FileItem, NoteItem};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AccountStore, AuthStore, CardStore, FileStore, NoteStore, SealedAccount, SealedCard,
    SealedFile, SealedNote, SearchPage, SearchQuery, StorageError, SyncStore, UserRecord,
};

/// Rows of one secret kind keyed by record id, each tagged with its owner.
struct Table<T> {
    rows: HashMap<Uuid, (Uuid, T)>,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    fn insert(&mut self, owner: Uuid, row: T) -> Uuid {
        let id = Uuid::new_v4();
        self.rows.insert(id, (owner, row));
        id
    }

    fn get(&self, owner: Uuid, id: Uuid) -> Result<T, StorageError> {
        match self.rows.get(&id) {
            Some((row_owner, row)) if *row_owner == owner => Ok(row.clone()),
            _ => Err(StorageError::NotFound),
        }
    }

    fn remove(&mut self, owner: Uuid, id: Uuid) -> Result<(), StorageError> {
        match self.rows.get(&id) {
            Some((row_owner, _)) if *row_owner == owner => {
                self.rows.remove(&id);
                Ok(())
            }
            _ => Err(StorageError::NotFound),
        }
    }

    /// Filter by owner and `display` fields, sort by `key` then id, paginate.
    fn search<K, I>(
        &self,
        owner: Uuid,
        query: &SearchQuery,
        display: impl Fn(&T) -> Vec<&str>,
        key: impl Fn(&T) -> K,
        item: impl Fn(Uuid, &T) -> I,
    ) -> SearchPage<I>
    where
        K: Ord,
    {
        let needle = query.substring.to_lowercase();
        let mut matched: Vec<(K, Uuid, &T)> = self
            .rows
            .iter()
            .filter(|(_, (row_owner, _))| *row_owner == owner)
            .filter(|(_, (_, row))| {
                display(row)
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .map(|(id, (_, row))| (key(row), *id, row))
            .collect();
        matched.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let total = matched.len() as u64;
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .map(|(_, id, row)| item(id, row))
            .collect();
        SearchPage { items, total }
    }
}

/// All stores in one process-local structure.
pub struct MemoryStorage {
    users: RwLock<HashMap<String, UserRecord>>,
    accounts: RwLock<Table<SealedAccount>>,
    cards: RwLock<Table<SealedCard>>,
    notes: RwLock<Table<SealedNote>>,
    files: RwLock<Table<SealedFile>>,
    sync: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            accounts: RwLock::new(Table::new()),
            cards: RwLock::new(Table::new()),
            notes: RwLock::new(Table::new()),
            files: RwLock::new(Table::new()),
            sync: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthStore for MemoryStorage {
    async fn save_user(&self, login: &str, password_hash: &str) -> Result<Uuid, StorageError> {
        let mut users = self.users.write().await;
        if users.contains_key(login) {
            return Err(StorageError::AlreadyExists);
        }
        let id = Uuid::new_v4();
        users.insert(
            login.to_owned(),
            UserRecord {
                id,
                login: login.to_owned(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(id)
    }

    async fn user(&self, login: &str) -> Result<UserRecord, StorageError> {
        self.users
            .read()
            .await
            .get(login)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AccountStore for MemoryStorage {
    async fn add(&self, owner: Uuid, account: SealedAccount) -> Result<Uuid, StorageError> {
        Ok(self.accounts.write().await.insert(owner, account))
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedAccount, StorageError> {
        self.accounts.read().await.get(owner, id)
    }

    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<AccountItem>, StorageError> {
        Ok(self.accounts.read().await.search(
            owner,
            query,
            |a| vec![a.login.as_str(), a.server.as_str()],
            |a| (a.server.clone(), a.login.clone()),
            |id, a| AccountItem {
                id: id.to_string(),
                login: a.login.clone(),
                server: a.server.clone(),
            },
        ))
    }

    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError> {
        self.accounts.write().await.remove(owner, id)
    }
}

#[async_trait]
impl CardStore for MemoryStorage {
    async fn add(&self, owner: Uuid, card: SealedCard) -> Result<Uuid, StorageError> {
        Ok(self.cards.write().await.insert(owner, card))
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedCard, StorageError> {
        self.cards.read().await.get(owner, id)
    }

    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<CardItem>, StorageError> {
        Ok(self.cards.read().await.search(
            owner,
            query,
            |c| vec![c.name.as_str(), c.mask.as_str()],
            |c| (c.name.clone(), c.mask.clone()),
            |id, c| CardItem {
                id: id.to_string(),
                name: c.name.clone(),
                mask: c.mask.clone(),
            },
        ))
    }

    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError> {
        self.cards.write().await.remove(owner, id)
    }
}

#[async_trait]
impl NoteStore for MemoryStorage {
    async fn add(&self, owner: Uuid, note: SealedNote) -> Result<Uuid, StorageError> {
        Ok(self.notes.write().await.insert(owner, note))
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedNote, StorageError> {
        self.notes.read().await.get(owner, id)
    }

    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<NoteItem>, StorageError> {
        Ok(self.notes.read().await.search(
            owner,
            query,
            |n| vec![n.name.as_str()],
            |n| n.name.clone(),
            |id, n| NoteItem {
                id: id.to_string(),
                name: n.name.clone(),
            },
        ))
    }

    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError> {
        self.notes.write().await.remove(owner, id)
    }
}

#[async_trait]
impl FileStore for MemoryStorage {
    async fn add(&self, owner: Uuid, file: SealedFile) -> Result<Uuid, StorageError> {
        let mut files = self.files.write().await;
        let taken = files
            .rows
            .values()
            .any(|(row_owner, f)| *row_owner == owner && f.name == file.name);
        if taken {
            return Err(StorageError::AlreadyExists);
        }
        Ok(files.insert(owner, file))
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedFile, StorageError> {
        self.files.read().await.get(owner, id)
    }

    async fn name_exists(&self, owner: Uuid, name: &str) -> Result<bool, StorageError> {
        Ok(self
            .files
            .read()
            .await
            .rows
            .values()
            .any(|(row_owner, f)| *row_owner == owner && f.name == name))
    }

    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<FileItem>, StorageError> {
        Ok(self.files.read().await.search(
            owner,
            query,
            |f| vec![f.name.as_str()],
            |f| f.name.clone(),
            |id, f| FileItem {
                id: id.to_string(),
                name: f.name.clone(),
            },
        ))
    }

    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError> {
        self.files.write().await.remove(owner, id)
    }
}

#[async_trait]
impl SyncStore for MemoryStorage {
    async fn get(&self, owner: Uuid) -> Result<DateTime<Utc>, StorageError> {
        self.sync
            .read()
            .await
            .get(&owner)
            .copied()
            .ok_or(StorageError::NotFound)
    }

    async fn set(&self, owner: Uuid) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut markers = self.sync.write().await;
        let marker = markers.entry(owner).or_insert(now);
        if now > *marker {
            *marker = now;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(login: &str, server: &str) -> SealedAccount {
        SealedAccount {
            login: login.into(),
            server: server.into(),
            password: "sealed-password".into(),
            meta: "sealed-meta".into(),
        }
    }

    fn query(substring: &str, offset: u64, limit: u32) -> SearchQuery {
        SearchQuery {
            substring: substring.into(),
            offset,
            limit,
        }
    }

    #[tokio::test]
    async fn records_are_scoped_to_owner() {
        let store = MemoryStorage::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let id = AccountStore::add(&store, alice, account("alice", "https://a.test"))
            .await
            .unwrap();

        assert!(AccountStore::get(&store, alice, id).await.is_ok());
        assert!(matches!(
            AccountStore::get(&store, bob, id).await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            AccountStore::remove(&store, bob, id).await,
            Err(StorageError::NotFound)
        ));
        assert!(AccountStore::get(&store, alice, id).await.is_ok());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_ordered_and_paginated() {
        let store = MemoryStorage::new();
        let owner = Uuid::new_v4();
        for (login, server) in [
            ("zed", "https://b.test"),
            ("amy", "https://b.test"),
            ("bob", "https://a.test"),
            ("eve", "https://other.org"),
        ] {
            AccountStore::add(&store, owner, account(login, server))
                .await
                .unwrap();
        }

        let page = AccountStore::search(&store, owner, &query("TEST", 0, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        let logins: Vec<_> = page.items.iter().map(|i| i.login.as_str()).collect();
        assert_eq!(logins, ["bob", "amy"]);

        let page = AccountStore::search(&store, owner, &query("test", 2, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].login, "zed");
    }

    #[tokio::test]
    async fn search_never_sees_other_owners() {
        let store = MemoryStorage::new();
        NoteStore::add(
            &store,
            Uuid::new_v4(),
            SealedNote {
                name: "shopping".into(),
                content: "sealed".into(),
                meta: "sealed".into(),
            },
        )
        .await
        .unwrap();
        let page = NoteStore::search(&store, Uuid::new_v4(), &query("", 0, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn duplicate_login_rejected() {
        let store = MemoryStorage::new();
        store.save_user("user", "hash").await.unwrap();
        assert!(matches!(
            store.save_user("user", "hash").await,
            Err(StorageError::AlreadyExists)
        ));
        assert_eq!(store.user("user").await.unwrap().login, "user");
        assert!(matches!(store.user("nobody").await, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn file_names_unique_per_owner() {
        let store = MemoryStorage::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let file = SealedFile {
            name: "id_rsa".into(),
            meta: "sealed".into(),
        };
        FileStore::add(&store, alice, file.clone()).await.unwrap();
        assert!(store.name_exists(alice, "id_rsa").await.unwrap());
        assert!(!store.name_exists(bob, "id_rsa").await.unwrap());
        assert!(matches!(
            FileStore::add(&store, alice, file.clone()).await,
            Err(StorageError::AlreadyExists)
        ));
        assert!(FileStore::add(&store, bob, file).await.is_ok());
    }

    #[tokio::test]
    async fn sync_marker_absent_until_first_set_and_monotonic() {
        let store = MemoryStorage::new();
        let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(matches!(SyncStore::get(&store, x).await, Err(StorageError::NotFound)));

        store.set(x).await.unwrap();
        let first = SyncStore::get(&store, x).await.unwrap();
        store.set(x).await.unwrap();
        let second = SyncStore::get(&store, x).await.unwrap();
        assert!(second >= first);

        store.set(y).await.unwrap();
        assert_eq!(SyncStore::get(&store, x).await.unwrap(), second);
    }
}
