//! Lead query operations.
//!
//! The lead store proper belongs to the surrounding CRM; these operations
//! cover the slice this subsystem needs: listing candidates for a batch,
//! flipping status after dispatch, and appending audit notes.

use chrono::Utc;
use rusqlite::types::ToSql;
use rusqlite::{params, Row};

use crate::domain::{AgentId, Lead, LeadId, LeadStatus, MarketId};
use crate::services::LeadFilter;
use crate::storage::database::{Database, Result};

/// Inserts a lead row.
pub async fn insert(db: &Database, lead: &Lead) -> Result<()> {
    let lead = lead.clone();

    db.with_conn(move |conn| {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO leads (id, email, status, market_id, agent_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                lead.id.0,
                lead.email,
                lead.status.as_str(),
                lead.market_id.as_ref().map(|m| m.0.clone()),
                lead.agent_id.as_ref().map(|a| a.0.clone()),
                now,
                now,
            ],
        )?;
        Ok(())
    })
    .await
}

/// Lists leads matching a filter, oldest first.
pub async fn list(db: &Database, filter: &LeadFilter) -> Result<Vec<Lead>> {
    let filter = filter.clone();

    db.with_conn(move |conn| {
        let mut sql =
            String::from("SELECT id, email, status, market_id, agent_id FROM leads");
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

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            args.push(Box::new(limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
            row_to_lead,
        )?;
        let leads: std::result::Result<Vec<_>, _> = rows.collect();
        Ok(leads?)
    })
    .await
}

/// Updates the status of a set of leads in one transaction.
pub async fn update_status(db: &Database, lead_ids: &[LeadId], status: LeadStatus) -> Result<()> {
    let lead_ids: Vec<String> = lead_ids.iter().map(|id| id.0.clone()).collect();

    db.transaction(move |tx| {
        let now = Utc::now().to_rfc3339();
        let mut stmt =
            tx.prepare("UPDATE leads SET status = ?1, updated_at = ?2 WHERE id = ?3")?;
        for id in &lead_ids {
            stmt.execute(params![status.as_str(), now, id])?;
        }
        Ok(())
    })
    .await
}

/// Appends an activity note to a lead's audit trail.
pub async fn append_activity(db: &Database, lead_id: &LeadId, note: &str) -> Result<()> {
    let lead_id = lead_id.clone();
    let note = note.to_string();

    db.with_conn(move |conn| {
        conn.execute(
            "INSERT INTO lead_activities (lead_id, note, created_at) VALUES (?1, ?2, ?3)",
            params![lead_id.0, note, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    })
    .await
}

/// Returns a lead's activity notes, oldest first.
pub async fn activities(db: &Database, lead_id: &LeadId) -> Result<Vec<String>> {
    let lead_id = lead_id.clone();

    db.with_conn(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT note FROM lead_activities WHERE lead_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([&lead_id.0], |row| row.get(0))?;
        let notes: std::result::Result<Vec<_>, _> = rows.collect();
        Ok(notes?)
    })
    .await
}

fn row_to_lead(row: &Row) -> rusqlite::Result<Lead> {
    let status_str: String = row.get(2)?;
    let status = LeadStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown lead status: {}", status_str).into(),
        )
    })?;

    Ok(Lead {
        id: LeadId(row.get(0)?),
        email: row.get(1)?,
        status,
        market_id: row.get::<_, Option<String>>(3)?.map(MarketId),
        agent_id: row.get::<_, Option<String>>(4)?.map(AgentId),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(id: &str, status: LeadStatus) -> Lead {
        Lead {
            id: LeadId::from(id),
            email: format!("{}@example.org", id),
            status,
            market_id: Some(MarketId::from("austin")),
            agent_id: None,
        }
    }

    #[tokio::test]
    async fn insert_and_list_round_trip() {
        let db = Database::open_in_memory().await.unwrap();
        insert(&db, &lead("l1", LeadStatus::New)).await.unwrap();
        insert(&db, &lead("l2", LeadStatus::Contacted)).await.unwrap();

        let all = list(&db, &LeadFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let fresh = list(
            &db,
            &LeadFilter {
                status: Some(LeadStatus::New),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, LeadId::from("l1"));
    }

    #[tokio::test]
    async fn list_honors_limit() {
        let db = Database::open_in_memory().await.unwrap();
        for i in 0..5 {
            insert(&db, &lead(&format!("l{}", i), LeadStatus::New))
                .await
                .unwrap();
        }

        let capped = list(
            &db,
            &LeadFilter {
                limit: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(capped.len(), 3);
    }

    #[tokio::test]
    async fn update_status_flips_all_given_leads() {
        let db = Database::open_in_memory().await.unwrap();
        insert(&db, &lead("l1", LeadStatus::New)).await.unwrap();
        insert(&db, &lead("l2", LeadStatus::New)).await.unwrap();
        insert(&db, &lead("l3", LeadStatus::New)).await.unwrap();

        update_status(
            &db,
            &[LeadId::from("l1"), LeadId::from("l2")],
            LeadStatus::Contacted,
        )
        .await
        .unwrap();

        let contacted = list(
            &db,
            &LeadFilter {
                status: Some(LeadStatus::Contacted),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(contacted.len(), 2);
    }

    #[tokio::test]
    async fn activity_log_appends_in_order() {
        let db = Database::open_in_memory().await.unwrap();
        insert(&db, &lead("l1", LeadStatus::New)).await.unwrap();
        let id = LeadId::from("l1");

        append_activity(&db, &id, "Queued for outreach via esp").await.unwrap();
        append_activity(&db, &id, "Bounced").await.unwrap();

        let notes = activities(&db, &id).await.unwrap();
        assert_eq!(notes, vec!["Queued for outreach via esp", "Bounced"]);
    }
}
