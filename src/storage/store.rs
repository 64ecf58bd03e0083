//! SQLite-backed implementations of the service storage traits.
//!
//! These adapters bridge the async service traits onto the query layer and
//! translate [`DatabaseError`] into the retryable [`StoreError`] surface the
//! services expect. A store failure is always distinguishable from an empty
//! result set.

use async_trait::async_trait;

use super::database::{Database, DatabaseError};
use super::queries;
use crate::domain::{AccountId, Lead, LeadId, LeadStatus, SendStatus, SenderAccount};
use crate::services::{AccountFilter, AccountStore, LeadFilter, LeadStore, StoreError, StoreResult};

fn map_err(err: DatabaseError) -> StoreError {
    match err {
        DatabaseError::Sqlite(e) => StoreError::Query(e.to_string()),
        DatabaseError::MigrationFailed(e) => StoreError::Unavailable(e),
        DatabaseError::Blocking(e) => StoreError::Unavailable(e),
        DatabaseError::Io(e) => StoreError::Unavailable(e.to_string()),
    }
}

/// [`AccountStore`] backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteAccountStore {
    db: Database,
}

impl SqliteAccountStore {
    /// Creates a store over an opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn list_accounts(&self, filter: &AccountFilter) -> StoreResult<Vec<SenderAccount>> {
        queries::accounts::list(&self.db, filter).await.map_err(map_err)
    }

    async fn get_account(&self, id: &AccountId) -> StoreResult<Option<SenderAccount>> {
        queries::accounts::get_by_id(&self.db, id).await.map_err(map_err)
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<SenderAccount>> {
        queries::accounts::get_by_email(&self.db, email)
            .await
            .map_err(map_err)
    }

    async fn insert_account(&self, account: &SenderAccount) -> StoreResult<()> {
        queries::accounts::insert(&self.db, account).await.map_err(map_err)
    }

    async fn set_status(&self, id: &AccountId, status: SendStatus) -> StoreResult<()> {
        queries::accounts::set_status(&self.db, id, status)
            .await
            .map_err(map_err)
    }

    async fn set_active(&self, id: &AccountId, active: bool) -> StoreResult<()> {
        queries::accounts::set_active(&self.db, id, active)
            .await
            .map_err(map_err)
    }

    async fn increment_sent(&self, id: &AccountId, n: u32) -> StoreResult<()> {
        queries::accounts::increment_sent(&self.db, id, n)
            .await
            .map_err(map_err)
    }

    async fn reset_sent_counters(&self) -> StoreResult<u32> {
        queries::accounts::reset_sent_today(&self.db)
            .await
            .map_err(map_err)
    }
}

/// [`LeadStore`] backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteLeadStore {
    db: Database,
}

impl SqliteLeadStore {
    /// Creates a store over an opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeadStore for SqliteLeadStore {
    async fn list_leads(&self, filter: &LeadFilter) -> StoreResult<Vec<Lead>> {
        queries::leads::list(&self.db, filter).await.map_err(map_err)
    }

    async fn update_status(&self, lead_ids: &[LeadId], status: LeadStatus) -> StoreResult<()> {
        queries::leads::update_status(&self.db, lead_ids, status)
            .await
            .map_err(map_err)
    }

    async fn append_activity(&self, lead_id: &LeadId, note: &str) -> StoreResult<()> {
        queries::leads::append_activity(&self.db, lead_id, note)
            .await
            .map_err(map_err)
    }
}
