//! SQL schema definitions as const strings.
//!
//! Contains the complete SQLite schema for the send-capacity scheduler.

/// SQL to create the sending accounts table.
///
/// `current_daily_limit` is deliberately absent: the effective limit is
/// derived from status and elapsed warmup time on every read, never stored
/// as ground truth.
pub const CREATE_ACCOUNTS: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    domain TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'warmup',
    base_daily_limit INTEGER NOT NULL,
    sent_today INTEGER NOT NULL DEFAULT 0,
    warmup_started_at TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    market_id TEXT,
    agent_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// SQL to create account indexes.
pub const CREATE_ACCOUNT_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_accounts_market ON accounts(market_id);
CREATE INDEX IF NOT EXISTS idx_accounts_agent ON accounts(agent_id);
CREATE INDEX IF NOT EXISTS idx_accounts_status ON accounts(status)
"#;

/// SQL to create the leads table.
pub const CREATE_LEADS: &str = r#"
CREATE TABLE IF NOT EXISTS leads (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'new',
    market_id TEXT,
    agent_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// SQL to create lead indexes.
pub const CREATE_LEAD_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status);
CREATE INDEX IF NOT EXISTS idx_leads_market ON leads(market_id);
CREATE INDEX IF NOT EXISTS idx_leads_agent ON leads(agent_id)
"#;

/// SQL to create the lead activity log.
pub const CREATE_LEAD_ACTIVITIES: &str = r#"
CREATE TABLE IF NOT EXISTS lead_activities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lead_id TEXT NOT NULL REFERENCES leads(id),
    note TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

/// SQL to create the lead activity index.
pub const CREATE_LEAD_ACTIVITY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_lead_activities_lead ON lead_activities(lead_id)
"#;

/// Returns all migrations in execution order.
pub fn all_migrations() -> Vec<&'static str> {
    vec![
        CREATE_ACCOUNTS,
        CREATE_ACCOUNT_INDEXES,
        CREATE_LEADS,
        CREATE_LEAD_INDEXES,
        CREATE_LEAD_ACTIVITIES,
        CREATE_LEAD_ACTIVITY_INDEX,
    ]
}
