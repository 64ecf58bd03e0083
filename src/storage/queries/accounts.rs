//! Sending account CRUD operations.
//!
//! Provides database operations for account rows. The effective daily limit
//! is never read from disk; rows come back with a zero placeholder and the
//! registry derives the real value.

use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, OptionalExtension, Row};

use crate::domain::{AccountId, AgentId, MarketId, SendStatus, SenderAccount};
use crate::services::AccountFilter;
use crate::storage::database::{Database, Result};

const ACCOUNT_COLUMNS: &str = "id, email, domain, status, base_daily_limit, sent_today, \
                               warmup_started_at, is_active, market_id, agent_id";

/// Inserts a new account row.
pub async fn insert(db: &Database, account: &SenderAccount) -> Result<()> {
    let account = account.clone();

    db.with_conn(move |conn| {
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO accounts (
                id, email, domain, status, base_daily_limit, sent_today,
                warmup_started_at, is_active, market_id, agent_id,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12
            )
            "#,
            params![
                account.id.0,
                account.email,
                account.domain,
                account.status.as_str(),
                account.base_daily_limit,
                account.sent_today,
                account.warmup_started_at.to_rfc3339(),
                account.is_active as i32,
                account.market_id.as_ref().map(|m| m.0.clone()),
                account.agent_id.as_ref().map(|a| a.0.clone()),
                now,
                now,
            ],
        )?;

        Ok(())
    })
    .await
}

/// Retrieves an account by its ID.
pub async fn get_by_id(db: &Database, account_id: &AccountId) -> Result<Option<SenderAccount>> {
    let account_id = account_id.clone();

    db.with_conn(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM accounts WHERE id = ?1",
            ACCOUNT_COLUMNS
        ))?;

        let result = stmt.query_row([&account_id.0], row_to_account).optional()?;
        Ok(result)
    })
    .await
}

/// Retrieves an account by mailbox address.
pub async fn get_by_email(db: &Database, email: &str) -> Result<Option<SenderAccount>> {
    let email = email.to_string();

    db.with_conn(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM accounts WHERE email = ?1",
            ACCOUNT_COLUMNS
        ))?;

        let result = stmt.query_row([&email], row_to_account).optional()?;
        Ok(result)
    })
    .await
}

/// Lists accounts matching a filter.
pub async fn list(db: &Database, filter: &AccountFilter) -> Result<Vec<SenderAccount>> {
    let filter = filter.clone();

    db.with_conn(move |conn| {
        let mut sql = format!("SELECT {} FROM accounts", ACCOUNT_COLUMNS);
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(market) = &filter.market_id {
            clauses.push("market_id = ?");
            args.push(Box::new(market.0.clone()));
        }
        if let Some(agent) = &filter.agent_id {
            clauses.push("agent_id = ?");
            args.push(Box::new(agent.0.clone()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            args.push(Box::new(status.as_str().to_string()));
        }
        if let Some(active) = filter.is_active {
            clauses.push("is_active = ?");
            args.push(Box::new(active as i32));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY email");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
            row_to_account,
        )?;
        let accounts: std::result::Result<Vec<_>, _> = rows.collect();
        Ok(accounts?)
    })
    .await
}

/// Overwrites an account's stored status.
pub async fn set_status(db: &Database, account_id: &AccountId, status: SendStatus) -> Result<()> {
    let account_id = account_id.clone();

    db.with_conn(move |conn| {
        conn.execute(
            "UPDATE accounts SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), account_id.0],
        )?;
        Ok(())
    })
    .await
}

/// Activates or deactivates an account.
pub async fn set_active(db: &Database, account_id: &AccountId, active: bool) -> Result<()> {
    let account_id = account_id.clone();

    db.with_conn(move |conn| {
        conn.execute(
            "UPDATE accounts SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active as i32, Utc::now().to_rfc3339(), account_id.0],
        )?;
        Ok(())
    })
    .await
}

/// Adds `n` to an account's sent-today counter.
///
/// A single storage-side add: concurrent callers serialize at the database,
/// so counts accumulate without an application-level read-modify-write.
pub async fn increment_sent(db: &Database, account_id: &AccountId, n: u32) -> Result<()> {
    let account_id = account_id.clone();

    db.with_conn(move |conn| {
        conn.execute(
            "UPDATE accounts SET sent_today = sent_today + ?1, updated_at = ?2 WHERE id = ?3",
            params![n, Utc::now().to_rfc3339(), account_id.0],
        )?;
        Ok(())
    })
    .await
}

/// Zeroes every sent-today counter, returning the number of rows touched.
///
/// The day-boundary reset; driven by an external scheduler.
pub async fn reset_sent_today(db: &Database) -> Result<u32> {
    db.with_conn(|conn| {
        let touched = conn.execute(
            "UPDATE accounts SET sent_today = 0, updated_at = ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(touched as u32)
    })
    .await
}

fn row_to_account(row: &Row) -> rusqlite::Result<SenderAccount> {
    let status_str: String = row.get(3)?;
    let status = SendStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown account status: {}", status_str).into(),
        )
    })?;

    let warmup_str: String = row.get(6)?;
    let warmup_started_at = DateTime::parse_from_rfc3339(&warmup_str)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, e.into())
        })?
        .with_timezone(&Utc);

    Ok(SenderAccount {
        id: AccountId(row.get(0)?),
        email: row.get(1)?,
        domain: row.get(2)?,
        status,
        base_daily_limit: row.get(4)?,
        sent_today: row.get(5)?,
        warmup_started_at,
        is_active: row.get::<_, i32>(7)? != 0,
        market_id: row.get::<_, Option<String>>(8)?.map(MarketId),
        agent_id: row.get::<_, Option<String>>(9)?.map(AgentId),
        // derived by the registry on read, never trusted from disk
        current_daily_limit: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn account(id: &str, email: &str) -> SenderAccount {
        SenderAccount {
            id: AccountId::from(id),
            email: email.to_string(),
            domain: "pool.example.com".to_string(),
            is_active: true,
            status: SendStatus::Warmup,
            base_daily_limit: 50,
            current_daily_limit: 0,
            sent_today: 0,
            warmup_started_at: Utc::now() - Duration::days(5),
            market_id: Some(MarketId::from("austin")),
            agent_id: None,
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let db = Database::open_in_memory().await.unwrap();
        let original = account("acct-1", "a@pool.example.com");

        insert(&db, &original).await.unwrap();
        let fetched = get_by_id(&db, &original.id).await.unwrap().unwrap();

        assert_eq!(fetched.email, original.email);
        assert_eq!(fetched.status, SendStatus::Warmup);
        assert_eq!(fetched.base_daily_limit, 50);
        assert_eq!(fetched.market_id, Some(MarketId::from("austin")));
        // timestamps survive rfc3339 round trip to the second
        assert_eq!(
            fetched.warmup_started_at.timestamp(),
            original.warmup_started_at.timestamp()
        );
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let db = Database::open_in_memory().await.unwrap();
        let result = get_by_id(&db, &AccountId::from("ghost")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn get_by_email_finds_account() {
        let db = Database::open_in_memory().await.unwrap();
        insert(&db, &account("acct-1", "a@pool.example.com"))
            .await
            .unwrap();

        let found = get_by_email(&db, "a@pool.example.com").await.unwrap();
        assert!(found.is_some());
        let missing = get_by_email(&db, "b@pool.example.com").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn list_filters_by_market_and_active() {
        let db = Database::open_in_memory().await.unwrap();

        insert(&db, &account("acct-1", "a@pool.example.com"))
            .await
            .unwrap();
        let mut other_market = account("acct-2", "b@pool.example.com");
        other_market.market_id = Some(MarketId::from("denver"));
        insert(&db, &other_market).await.unwrap();
        let mut inactive = account("acct-3", "c@pool.example.com");
        inactive.is_active = false;
        insert(&db, &inactive).await.unwrap();

        let austin = list(&db, &AccountFilter::new().market("austin"))
            .await
            .unwrap();
        assert_eq!(austin.len(), 1);
        assert_eq!(austin[0].id, AccountId::from("acct-1"));

        let active = list(&db, &AccountFilter::new().active_only()).await.unwrap();
        assert_eq!(active.len(), 2);

        let all = list(&db, &AccountFilter::new()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn set_status_persists() {
        let db = Database::open_in_memory().await.unwrap();
        let acct = account("acct-1", "a@pool.example.com");
        insert(&db, &acct).await.unwrap();

        set_status(&db, &acct.id, SendStatus::Suspended).await.unwrap();

        let fetched = get_by_id(&db, &acct.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, SendStatus::Suspended);
    }

    #[tokio::test]
    async fn increment_sent_accumulates() {
        let db = Database::open_in_memory().await.unwrap();
        let acct = account("acct-1", "a@pool.example.com");
        insert(&db, &acct).await.unwrap();

        increment_sent(&db, &acct.id, 10).await.unwrap();
        increment_sent(&db, &acct.id, 7).await.unwrap();

        let fetched = get_by_id(&db, &acct.id).await.unwrap().unwrap();
        assert_eq!(fetched.sent_today, 17);
    }

    #[tokio::test]
    async fn concurrent_increments_never_lose_updates() {
        let db = Database::open_in_memory().await.unwrap();
        let acct = account("acct-1", "a@pool.example.com");
        insert(&db, &acct).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let db = db.clone();
            let id = acct.id.clone();
            handles.push(tokio::spawn(async move {
                increment_sent(&db, &id, 3).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let fetched = get_by_id(&db, &acct.id).await.unwrap().unwrap();
        assert_eq!(fetched.sent_today, 60);
    }

    #[tokio::test]
    async fn reset_sent_today_touches_all_rows() {
        let db = Database::open_in_memory().await.unwrap();
        insert(&db, &account("acct-1", "a@pool.example.com"))
            .await
            .unwrap();
        insert(&db, &account("acct-2", "b@pool.example.com"))
            .await
            .unwrap();
        increment_sent(&db, &AccountId::from("acct-1"), 12)
            .await
            .unwrap();

        let touched = reset_sent_today(&db).await.unwrap();
        assert_eq!(touched, 2);

        let fetched = get_by_id(&db, &AccountId::from("acct-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.sent_today, 0);
    }
}
