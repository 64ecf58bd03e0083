//! Lead domain types.
//!
//! Leads live in the external CRM store; this subsystem only consumes a
//! minimal shape and flips a lead to contacted after a successful dispatch.

use serde::{Deserialize, Serialize};

use super::{AgentId, LeadId, MarketId};

/// Pipeline status of a lead.
///
/// Only the `New -> Contacted` transition is performed here; the remaining
/// states exist so store filters can express them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    /// Not yet contacted.
    New,
    /// At least one outreach email dispatched.
    Contacted,
    /// Lead replied.
    Replied,
    /// Delivery bounced.
    Bounced,
    /// Lead opted out.
    Unsubscribed,
}

impl LeadStatus {
    /// Database/API string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Replied => "replied",
            Self::Bounced => "bounced",
            Self::Unsubscribed => "unsubscribed",
        }
    }

    /// Parses the database/API string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "replied" => Some(Self::Replied),
            "bounced" => Some(Self::Bounced),
            "unsubscribed" => Some(Self::Unsubscribed),
            _ => None,
        }
    }
}

/// Minimal lead shape consumed by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    /// Identifier in the external lead store.
    pub id: LeadId,
    /// Destination address.
    pub email: String,
    /// Pipeline status.
    pub status: LeadStatus,
    /// Optional market scope.
    pub market_id: Option<MarketId>,
    /// Optional agent scope.
    pub agent_id: Option<AgentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_round_trip() {
        for status in [
            LeadStatus::New,
            LeadStatus::Contacted,
            LeadStatus::Replied,
            LeadStatus::Bounced,
            LeadStatus::Unsubscribed,
        ] {
            assert_eq!(LeadStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(LeadStatus::parse("stale"), None);
    }

    #[test]
    fn lead_serialization() {
        let lead = Lead {
            id: LeadId::from("lead-1"),
            email: "prospect@example.org".to_string(),
            status: LeadStatus::New,
            market_id: Some(MarketId::from("austin")),
            agent_id: None,
        };

        let json = serde_json::to_string(&lead).unwrap();
        let back: Lead = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, LeadStatus::New);
        assert_eq!(back.market_id, Some(MarketId::from("austin")));
    }
}
