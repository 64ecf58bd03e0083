//! Greedy distribution planning.
//!
//! Allocates a requested send volume across ready accounts by greedy
//! bin-filling: accounts are visited in descending order of remaining quota
//! and each absorbs as much of the residual demand as it can. This touches
//! the fewest accounts per batch and wastes no capacity, so a batch that
//! fits within the pool's total remaining quota always admits in full.

use serde::Serialize;
use thiserror::Error;

use super::capacity::ReadyAccount;
use crate::domain::AccountId;

/// Errors from distribution planning.
#[derive(Debug, Error)]
pub enum DistributionError {
    /// The requested volume is not a positive number.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Volume assigned to a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// Account receiving the volume.
    pub account_id: AccountId,
    /// Mailbox address, carried for telemetry and provider payloads.
    pub account_email: String,
    /// Leads assigned to this account.
    pub count: u32,
}

/// The outcome of allocating a requested volume across ready accounts.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionPlan {
    /// Volume the caller asked for.
    pub requested: u32,
    /// Per-account assignments, in allocation order.
    pub allocations: Vec<Allocation>,
    /// Whether the full request fits today.
    pub can_send_all: bool,
    /// Whether any volume fits today.
    pub can_send_partial: bool,
    /// Sum of allocation counts.
    pub total_allocated: u32,
    /// Portion of the request that must wait.
    pub shortfall: u32,
    /// Human-readable summary of the plan.
    pub message: String,
}

/// Plans a distribution of `requested` leads over the ready set.
///
/// `ready` must already be sorted by remaining quota descending, as produced
/// by [`CapacitySnapshot::build`](super::capacity::CapacitySnapshot::build).
///
/// # Errors
///
/// Returns [`DistributionError::InvalidRequest`] when `requested` is zero;
/// an empty request is a caller bug, not a trivially satisfied plan.
pub fn plan_distribution(
    requested: u32,
    ready: &[ReadyAccount],
) -> Result<DistributionPlan, DistributionError> {
    if requested == 0 {
        return Err(DistributionError::InvalidRequest(
            "requested lead count must be greater than zero".to_string(),
        ));
    }

    let mut allocations = Vec::new();
    let mut leads_left = requested;

    for account in ready {
        if leads_left == 0 {
            break;
        }
        let take = leads_left.min(account.remaining);
        if take > 0 {
            allocations.push(Allocation {
                account_id: account.id.clone(),
                account_email: account.email.clone(),
                count: take,
            });
            leads_left -= take;
        }
    }

    let shortfall = leads_left;
    let total_allocated = requested - shortfall;
    let can_send_all = shortfall == 0;
    let can_send_partial = !allocations.is_empty();

    let message = if can_send_all {
        format!("All {} leads can be sent today", requested)
    } else if can_send_partial {
        format!(
            "Only {} of {} leads can be sent today ({} must wait)",
            total_allocated, requested, shortfall
        )
    } else {
        "No sending capacity available".to_string()
    };

    Ok(DistributionPlan {
        requested,
        allocations,
        can_send_all,
        can_send_partial,
        total_allocated,
        shortfall,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SendStatus;
    use pretty_assertions::assert_eq;

    fn ready(id: &str, remaining: u32) -> ReadyAccount {
        ReadyAccount {
            id: AccountId::from(id),
            email: format!("{}@example.com", id),
            status: SendStatus::Active,
            limit: remaining,
            sent: 0,
            remaining,
        }
    }

    #[test]
    fn fills_largest_accounts_first() {
        // Three ready accounts with remaining [80, 50, 20], requested 100:
        // the first two absorb everything.
        let pool = vec![ready("a", 80), ready("b", 50), ready("c", 20)];

        let plan = plan_distribution(100, &pool).unwrap();

        assert_eq!(plan.allocations.len(), 2);
        assert_eq!(plan.allocations[0].account_id, AccountId::from("a"));
        assert_eq!(plan.allocations[0].count, 80);
        assert_eq!(plan.allocations[1].account_id, AccountId::from("b"));
        assert_eq!(plan.allocations[1].count, 20);
        assert_eq!(plan.shortfall, 0);
        assert!(plan.can_send_all);
        assert_eq!(plan.message, "All 100 leads can be sent today");
    }

    #[test]
    fn partial_fill_reports_shortfall() {
        let pool = vec![ready("a", 80), ready("b", 50), ready("c", 20)];

        let plan = plan_distribution(200, &pool).unwrap();

        let counts: Vec<u32> = plan.allocations.iter().map(|a| a.count).collect();
        assert_eq!(counts, vec![80, 50, 20]);
        assert_eq!(plan.total_allocated, 150);
        assert_eq!(plan.shortfall, 50);
        assert!(!plan.can_send_all);
        assert!(plan.can_send_partial);
        assert_eq!(
            plan.message,
            "Only 150 of 200 leads can be sent today (50 must wait)"
        );
    }

    #[test]
    fn empty_pool_yields_all_shortfall() {
        let plan = plan_distribution(40, &[]).unwrap();

        assert!(plan.allocations.is_empty());
        assert_eq!(plan.total_allocated, 0);
        assert_eq!(plan.shortfall, 40);
        assert!(!plan.can_send_all);
        assert!(!plan.can_send_partial);
        assert_eq!(plan.message, "No sending capacity available");
    }

    #[test]
    fn zero_request_is_an_input_error() {
        let pool = vec![ready("a", 80)];
        let result = plan_distribution(0, &pool);
        assert!(matches!(result, Err(DistributionError::InvalidRequest(_))));
    }

    #[test]
    fn allocation_conservation() {
        let pool = vec![ready("a", 7), ready("b", 5), ready("c", 3), ready("d", 1)];

        for requested in [1, 3, 8, 15, 16, 17, 100] {
            let plan = plan_distribution(requested, &pool).unwrap();
            let allocated: u32 = plan.allocations.iter().map(|a| a.count).sum();

            assert_eq!(allocated, plan.total_allocated);
            assert_eq!(plan.total_allocated + plan.shortfall, plan.requested);
            for allocation in &plan.allocations {
                let source = pool
                    .iter()
                    .find(|r| r.id == allocation.account_id)
                    .unwrap();
                assert!(allocation.count <= source.remaining);
            }
        }
    }

    #[test]
    fn fits_whenever_aggregate_capacity_suffices() {
        // Greedy wastes no capacity: any request up to the pool total admits
        // in full regardless of individual account sizes.
        let pool = vec![ready("a", 13), ready("b", 9), ready("c", 4), ready("d", 2)];
        let total: u32 = pool.iter().map(|r| r.remaining).sum();

        for requested in 1..=total {
            let plan = plan_distribution(requested, &pool).unwrap();
            assert_eq!(plan.shortfall, 0, "requested {} should fit", requested);
        }
    }

    #[test]
    fn exact_fit_consumes_entire_pool() {
        let pool = vec![ready("a", 80), ready("b", 50), ready("c", 20)];

        let plan = plan_distribution(150, &pool).unwrap();

        assert_eq!(plan.allocations.len(), 3);
        assert!(plan.can_send_all);
        assert_eq!(plan.message, "All 150 leads can be sent today");
    }

    #[test]
    fn stops_early_once_demand_is_met() {
        let pool = vec![ready("a", 80), ready("b", 50), ready("c", 20)];

        let plan = plan_distribution(10, &pool).unwrap();

        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocations[0].count, 10);
    }
}
