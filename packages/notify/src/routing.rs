//! Notification routing matrix.
//!
//! Maps (category, gate, action) to the concrete roles that should hear
//! about a workflow event. Approver roles always come from the core
//! requirement matrix; this table adds the notify and inform audiences
//! and the notice period for each cell.

use std::collections::HashMap;
use std::sync::LazyLock;

use stagegate_core::{
    requirement_matrix, Category, NotificationKind, Role, DEFAULT_NOTICE_DAYS,
};

/// A routing target: a concrete role, or the review-team pseudo-role
/// expanded at lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Role(Role),
    ProjectReviewTeam,
}

/// Expansion of the `project_review_team` pseudo-role. Expanded once,
/// here, never at dispatch call sites.
pub const PROJECT_REVIEW_TEAM: [Role; 5] = [
    Role::BuDirector,
    Role::AmeaPresident,
    Role::Ceo,
    Role::TechnicalDirector,
    Role::FinanceManager,
];

/// One (category, gate) routing cell.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub notify: Vec<RouteTarget>,
    pub inform: Vec<RouteTarget>,
    pub notice_days: i64,
}

/// A fully resolved route for one action: pseudo-roles expanded,
/// duplicates removed, approver order preserved first.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub approvers: Vec<Role>,
    pub targets: Vec<Role>,
    pub notice_days: i64,
}

pub static ROUTING_MATRIX: LazyLock<RoutingMatrix> = LazyLock::new(RoutingMatrix::new);

#[derive(Debug)]
pub struct RoutingMatrix {
    entries: HashMap<(Category, i64), RouteEntry>,
    default_entry: RouteEntry,
}

impl RoutingMatrix {
    fn new() -> Self {
        use Category::*;
        use RouteTarget::*;

        let mut entries = HashMap::new();
        for category in Category::ALL {
            for gate in 1..=7i64 {
                // The bid manager runs gates 1-3, the project manager
                // gates 4-7; they are kept in the loop for their phase.
                let operating = if gate <= 3 {
                    Role(stagegate_core::Role::BidManager)
                } else {
                    Role(stagegate_core::Role::ProjectManager)
                };

                let (inform, notice_days) = match category {
                    Category1a | Category1b => {
                        (vec![Role(stagegate_core::Role::BranchManager)], 14)
                    }
                    Category1c => (vec![Role(stagegate_core::Role::BuDirector)], 14),
                    Category2 => {
                        if gate <= 3 {
                            (vec![Role(stagegate_core::Role::SalesDirector)], 14)
                        } else {
                            (vec![ProjectReviewTeam], 21)
                        }
                    }
                    Category3 => (vec![ProjectReviewTeam], 21),
                };

                entries.insert(
                    (category, gate),
                    RouteEntry {
                        notify: vec![operating],
                        inform,
                        notice_days,
                    },
                );
            }
        }

        Self {
            entries,
            default_entry: RouteEntry {
                notify: Vec::new(),
                inform: Vec::new(),
                notice_days: DEFAULT_NOTICE_DAYS,
            },
        }
    }

    fn entry(&self, category: Category, gate: i64) -> &RouteEntry {
        self.entries
            .get(&(category, gate))
            .unwrap_or(&self.default_entry)
    }

    /// Notice period for a (category, gate) cell, driving gate deadlines.
    pub fn notice_days(&self, category: Category, gate: i64) -> i64 {
        self.entry(category, gate).notice_days
    }

    /// Resolve the concrete roles an action at (category, gate) targets.
    ///
    /// Approval requests go to the approvers and the notify set; every
    /// other action additionally reaches the inform set.
    pub fn route(&self, category: Category, gate: i64, action: NotificationKind) -> ResolvedRoute {
        let approvers = requirement_matrix()
            .required_roles(category, gate)
            .to_vec();
        let entry = self.entry(category, gate);

        let mut targets: Vec<Role> = Vec::new();
        let push_unique = |role: Role, targets: &mut Vec<Role>| {
            if !targets.contains(&role) {
                targets.push(role);
            }
        };

        for role in &approvers {
            push_unique(*role, &mut targets);
        }
        for target in &entry.notify {
            for role in expand(*target) {
                push_unique(role, &mut targets);
            }
        }
        if action != NotificationKind::ApprovalRequest {
            for target in &entry.inform {
                for role in expand(*target) {
                    push_unique(role, &mut targets);
                }
            }
        }

        ResolvedRoute {
            approvers,
            targets,
            notice_days: entry.notice_days,
        }
    }
}

fn expand(target: RouteTarget) -> Vec<Role> {
    match target {
        RouteTarget::Role(role) => vec![role],
        RouteTarget::ProjectReviewTeam => PROJECT_REVIEW_TEAM.to_vec(),
    }
}

/// Convenience accessor for the global registry.
pub fn routing_matrix() -> &'static RoutingMatrix {
    &ROUTING_MATRIX
}
