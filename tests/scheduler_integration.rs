//! End-to-end admission flows against an in-memory SQLite database.
//!
//! These tests wire the real storage adapters under the dispatch service
//! with a scripted send provider, verifying that admission decisions,
//! counter persistence, and lead updates hold together across module
//! boundaries. Detailed unit coverage lives in each service module.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use tokio_test::assert_ok;

use dripline::domain::{AccountId, Lead, LeadId, LeadStatus, SendStatus, SenderAccount};
use dripline::providers::esp::{BatchReceipt, EspError, SendProvider};
use dripline::services::{
    AccountFilter, AccountService, AdmissionOptions, Allocation, DispatchError, DispatchService,
    LeadFilter,
};
use dripline::storage::{queries, Database, SqliteAccountStore, SqliteLeadStore};

struct ScriptedProvider {
    receipt: Option<BatchReceipt>,
    calls: Arc<Mutex<u32>>,
}

impl ScriptedProvider {
    fn succeeding(receipt: BatchReceipt) -> Self {
        Self {
            receipt: Some(receipt),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    fn failing() -> Self {
        Self {
            receipt: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Shared handle to the call counter, for asserting after the provider
    /// has moved into the service.
    fn call_counter(&self) -> Arc<Mutex<u32>> {
        self.calls.clone()
    }
}

#[async_trait]
impl SendProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted-esp"
    }

    async fn send_batch(
        &self,
        _allocations: &[Allocation],
        leads: &[Lead],
    ) -> dripline::providers::esp::Result<BatchReceipt> {
        *self.calls.lock().unwrap() += 1;
        match &self.receipt {
            Some(receipt) => Ok(receipt.clone()),
            None => Err(EspError::Provider(format!(
                "upstream rejected {} leads",
                leads.len()
            ))),
        }
    }
}

fn pool_account(id: &str, days_old: i64, base_limit: u32, sent_today: u32) -> SenderAccount {
    SenderAccount {
        id: AccountId::from(id),
        email: format!("{}@pool.example.com", id),
        domain: "pool.example.com".to_string(),
        is_active: true,
        status: SendStatus::Warmup,
        base_daily_limit: base_limit,
        current_daily_limit: 0,
        sent_today,
        warmup_started_at: Utc::now() - Duration::days(days_old),
        market_id: None,
        agent_id: None,
    }
}

fn new_lead(i: usize) -> Lead {
    Lead {
        id: LeadId::from(format!("lead-{}", i)),
        email: format!("prospect{}@example.org", i),
        status: LeadStatus::New,
        market_id: None,
        agent_id: None,
    }
}

async fn seed(db: &Database, accounts: &[SenderAccount], lead_count: usize) {
    for account in accounts {
        queries::accounts::insert(db, account).await.unwrap();
    }
    for i in 0..lead_count {
        queries::leads::insert(db, &new_lead(i)).await.unwrap();
    }
}

fn dispatch_service(
    db: &Database,
    provider: ScriptedProvider,
) -> DispatchService<SqliteAccountStore, SqliteLeadStore, ScriptedProvider> {
    DispatchService::new(
        AccountService::new(SqliteAccountStore::new(db.clone())),
        SqliteLeadStore::new(db.clone()),
        provider,
    )
}

#[tokio::test]
async fn capacity_snapshot_reflects_warmup_lifecycle() {
    let db = Database::open_in_memory().await.unwrap();
    seed(
        &db,
        &[
            pool_account("young", 10, 50, 0),  // warmup, no capacity
            pool_account("mid", 25, 100, 10),  // ramping: limit 60
            pool_account("aged", 40, 100, 30), // active: limit 100
        ],
        0,
    )
    .await;
    let service = dispatch_service(&db, ScriptedProvider::failing());

    let snapshot = service.capacity(&AccountFilter::new()).await.unwrap();

    assert_eq!(snapshot.total_capacity, 160);
    assert_eq!(snapshot.total_remaining, 50 + 70);
    assert_eq!(snapshot.ready_accounts.len(), 2);
    assert_eq!(snapshot.ready_accounts[0].id, AccountId::from("aged"));
    assert!(snapshot
        .warnings
        .contains(&"1 account(s) still warming up".to_string()));
}

#[tokio::test]
async fn plan_preview_has_no_side_effects() {
    let db = Database::open_in_memory().await.unwrap();
    seed(&db, &[pool_account("aged", 40, 80, 0)], 0).await;
    let service = dispatch_service(&db, ScriptedProvider::failing());

    let plan = service.plan(200, &AccountFilter::new()).await.unwrap();

    assert_eq!(plan.total_allocated, 80);
    assert_eq!(plan.shortfall, 120);
    assert_eq!(
        plan.message,
        "Only 80 of 200 leads can be sent today (120 must wait)"
    );

    let stored = queries::accounts::get_by_id(&db, &AccountId::from("aged"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.sent_today, 0);
}

#[tokio::test]
async fn admitted_batch_persists_counters_and_lead_updates() {
    let db = Database::open_in_memory().await.unwrap();
    seed(
        &db,
        &[pool_account("a", 40, 80, 0), pool_account("b", 40, 50, 0)],
        100,
    )
    .await;
    let service = dispatch_service(
        &db,
        ScriptedProvider::succeeding(BatchReceipt {
            uploaded: 100,
            skipped: 0,
            per_account: None,
        }),
    );

    let receipt = tokio_test::assert_ok!(
        service
            .admit_batch(100, &AccountFilter::new(), &AdmissionOptions::new())
            .await
    );
    assert_eq!(receipt.uploaded, 100);
    assert!(receipt.plan.can_send_all);

    // Counters landed in SQLite following the greedy plan.
    let a = queries::accounts::get_by_id(&db, &AccountId::from("a"))
        .await
        .unwrap()
        .unwrap();
    let b = queries::accounts::get_by_id(&db, &AccountId::from("b"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a.sent_today, 80);
    assert_eq!(b.sent_today, 20);

    // Every dispatched lead is contacted with an audit note.
    let remaining_new = queries::leads::list(
        &db,
        &LeadFilter {
            status: Some(LeadStatus::New),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(remaining_new.is_empty());

    let notes = queries::leads::activities(&db, &LeadId::from("lead-0"))
        .await
        .unwrap();
    assert_eq!(notes, vec!["Queued for outreach via scripted-esp"]);
}

#[tokio::test]
async fn oversized_batch_is_rejected_with_zero_side_effects() {
    let db = Database::open_in_memory().await.unwrap();
    seed(
        &db,
        &[pool_account("a", 40, 80, 0), pool_account("b", 25, 100, 20)],
        500,
    )
    .await;
    let provider = ScriptedProvider::succeeding(BatchReceipt {
        uploaded: 500,
        skipped: 0,
        per_account: None,
    });
    let provider_calls = provider.call_counter();
    let service = dispatch_service(&db, provider);

    // Remaining: 80 (active) + 40 (ramping limit 60, 20 used) = 120.
    let err = service
        .admit_batch(500, &AccountFilter::new(), &AdmissionOptions::new())
        .await
        .unwrap_err();

    match err {
        DispatchError::CapacityExceeded {
            requested,
            available,
            recommendation,
        } => {
            assert_eq!(requested, 500);
            assert_eq!(available, 120);
            assert_eq!(
                recommendation,
                "Reduce the batch to 120 leads or wait until tomorrow"
            );
        }
        other => panic!("expected CapacityExceeded, got {:?}", other),
    }

    assert_eq!(*provider_calls.lock().unwrap(), 0);
    let a = queries::accounts::get_by_id(&db, &AccountId::from("a"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a.sent_today, 0);
    let contacted = queries::leads::list(
        &db,
        &LeadFilter {
            status: Some(LeadStatus::Contacted),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(contacted.is_empty());
}

#[tokio::test]
async fn provider_failure_leaves_counters_and_leads_untouched() {
    let db = Database::open_in_memory().await.unwrap();
    seed(&db, &[pool_account("a", 40, 80, 0)], 50).await;
    let service = dispatch_service(&db, ScriptedProvider::failing());

    let err = service
        .admit_batch(50, &AccountFilter::new(), &AdmissionOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Provider(_)));

    let a = queries::accounts::get_by_id(&db, &AccountId::from("a"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a.sent_today, 0);

    let still_new = queries::leads::list(
        &db,
        &LeadFilter {
            status: Some(LeadStatus::New),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(still_new.len(), 50);
}

#[tokio::test]
async fn suspended_account_is_excluded_until_resumed() {
    let db = Database::open_in_memory().await.unwrap();
    seed(&db, &[pool_account("a", 40, 80, 0)], 0).await;
    let service = dispatch_service(&db, ScriptedProvider::failing());
    let id = AccountId::from("a");

    service.accounts().suspend(&id).await.unwrap();
    let snapshot = service.capacity(&AccountFilter::new()).await.unwrap();
    assert_eq!(snapshot.total_remaining, 0);
    assert!(snapshot
        .warnings
        .contains(&"1 account(s) suspended - check bounce rates".to_string()));

    service.accounts().resume(&id).await.unwrap();
    let snapshot = service.capacity(&AccountFilter::new()).await.unwrap();
    assert_eq!(snapshot.total_remaining, 80);
}

#[tokio::test]
async fn daily_reset_restores_capacity() {
    let db = Database::open_in_memory().await.unwrap();
    seed(&db, &[pool_account("a", 40, 80, 80)], 0).await;
    let service = dispatch_service(&db, ScriptedProvider::failing());

    let snapshot = service.capacity(&AccountFilter::new()).await.unwrap();
    assert_eq!(snapshot.total_remaining, 0);

    let touched = service.accounts().reset_daily_counters().await.unwrap();
    assert_eq!(touched, 1);

    let snapshot = service.capacity(&AccountFilter::new()).await.unwrap();
    assert_eq!(snapshot.total_remaining, 80);
}
