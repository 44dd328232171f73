//! Canonical approval requirement matrix.
//!
//! One table answers "which roles must sign off on gate N for a project of
//! category C". The hierarchy display and the advancement engine both read
//! this registry; there is no second copy to drift from it.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::types::{Category, Role};

/// Sign-off requirement for one (category, gate) cell.
#[derive(Debug, Clone)]
pub struct GateRequirement {
    /// Roles that must each hold an approved record. Order is the
    /// hierarchy display order; completion checks use set semantics.
    pub roles: Vec<Role>,
    /// When true and `roles` is empty, the gate's approval precondition
    /// is satisfied without any records. When false, an empty cell (or a
    /// gate with no seeded records) blocks advancement.
    pub auto_approve: bool,
}

impl GateRequirement {
    fn of(roles: &[Role], auto_approve: bool) -> Self {
        Self {
            roles: roles.to_vec(),
            auto_approve,
        }
    }
}

/// Registry for the approval requirement table, built once at startup.
pub static REQUIREMENT_MATRIX: LazyLock<RequirementMatrix> = LazyLock::new(RequirementMatrix::new);

#[derive(Debug)]
pub struct RequirementMatrix {
    entries: HashMap<(Category, i64), GateRequirement>,
    empty: GateRequirement,
}

impl RequirementMatrix {
    fn new() -> Self {
        use Category::*;
        use Role::*;

        let mut entries = HashMap::new();
        let rows: [(Category, [(&[Role], bool); 7]); 5] = [
            (
                Category1a,
                [
                    (&[BidManager], false),
                    (&[BranchManager], false),
                    (&[BranchManager], false),
                    (&[BranchManager], false),
                    (&[ProjectManager], false),
                    (&[], true),
                    (&[BranchManager], false),
                ],
            ),
            (
                Category1b,
                [
                    (&[BranchManager], false),
                    (&[BranchManager], false),
                    (&[BranchManager, FinanceManager], false),
                    (&[BranchManager, FinanceManager], false),
                    (&[BranchManager], false),
                    (&[BranchManager], false),
                    (&[BranchManager], false),
                ],
            ),
            (
                Category1c,
                [
                    (&[BranchManager], false),
                    (&[BranchManager, TechnicalDirector], false),
                    (&[BranchManager, FinanceManager], false),
                    (&[BuDirector, FinanceManager], false),
                    (&[BuDirector], false),
                    (&[BranchManager], false),
                    (&[BranchManager], false),
                ],
            ),
            (
                Category2,
                [
                    (&[BuDirector], false),
                    (&[BuDirector, TechnicalDirector], false),
                    (&[BuDirector, FinanceManager, SalesDirector], false),
                    (&[BuDirector, FinanceManager, AmeaPresident], false),
                    (&[BuDirector, TechnicalDirector], false),
                    (&[BuDirector], false),
                    (&[BuDirector], false),
                ],
            ),
            (
                Category3,
                [
                    (&[BuDirector], false),
                    (&[BuDirector, TechnicalDirector, SalesDirector], false),
                    (&[BuDirector, FinanceManager, AmeaPresident], false),
                    (&[AmeaPresident, Ceo, FinanceManager], false),
                    (&[BuDirector, AmeaPresident], false),
                    (&[BuDirector, AmeaPresident], false),
                    (&[BuDirector, Ceo], false),
                ],
            ),
        ];

        for (category, gates) in rows {
            for (offset, (roles, auto_approve)) in gates.into_iter().enumerate() {
                entries.insert(
                    (category, offset as i64 + 1),
                    GateRequirement::of(roles, auto_approve),
                );
            }
        }

        Self {
            entries,
            empty: GateRequirement {
                roles: Vec::new(),
                auto_approve: false,
            },
        }
    }

    /// Requirement for a (category, gate) cell. A gate outside 1-7 yields
    /// the empty, non-auto-approving requirement: zero roles required,
    /// advancement still blocked.
    pub fn requirement(&self, category: Category, gate: i64) -> &GateRequirement {
        self.entries.get(&(category, gate)).unwrap_or(&self.empty)
    }

    /// Ordered required roles for a (category, gate) cell.
    pub fn required_roles(&self, category: Category, gate: i64) -> &[Role] {
        &self.requirement(category, gate).roles
    }
}

/// Role authorized to resubmit a rejected approval for a project of the
/// given category at the given gate: the bid manager owns the bid phase
/// (gates 1-3), the project manager the delivery phase (gates 4-7).
pub fn resubmission_role(_category: Category, gate: i64) -> Role {
    if gate <= 3 {
        Role::BidManager
    } else {
        Role::ProjectManager
    }
}

/// Convenience accessor for the global registry.
pub fn requirement_matrix() -> &'static RequirementMatrix {
    &REQUIREMENT_MATRIX
}
