//! Visibility policy: which lead rows a caller may see.
//!
//! A `Scope` is a pure function of the caller. It renders two ways that
//! must always agree:
//!   - `permits()`   for a single lead already in memory
//!   - `predicate()` as a SQL fragment over `lead l JOIN app_user u`
//!
//! A team filter, when present, is ANDed with the role restriction.

use crate::{
    identity::Caller,
    role::ScopeKind,
    types::{TeamId, UserId},
};
use rusqlite::types::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Leads owned by members of `team_ids`, plus the manager's own leads.
    Team {
        manager_id: UserId,
        team_ids:   Vec<TeamId>,
    },
    Own {
        user_id: UserId,
    },
}

/// Ownership facts about a lead that the policy depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadOwner {
    pub user_id:   UserId,
    pub team_id:   Option<TeamId>,
    pub team_name: Option<String>,
}

/// A WHERE fragment plus its positional values, in order.
#[derive(Debug, Clone, Default)]
pub struct SqlPredicate {
    pub clause: String,
    pub values: Vec<Value>,
}

impl SqlPredicate {
    pub fn always() -> Self {
        Self {
            clause: "1 = 1".into(),
            values: Vec::new(),
        }
    }

    /// AND two predicates together, keeping value order aligned with `?`s.
    pub fn and(mut self, other: SqlPredicate) -> Self {
        self.clause = format!("({}) AND ({})", self.clause, other.clause);
        self.values.extend(other.values);
        self
    }

    /// Leads owned by members of `team_ids`. Matches nothing when empty.
    pub fn team_members(team_ids: &[TeamId]) -> Self {
        if team_ids.is_empty() {
            return Self {
                clause: "1 = 0".into(),
                values: Vec::new(),
            };
        }
        Self {
            clause: format!("u.team_id IN ({})", vec!["?"; team_ids.len()].join(", ")),
            values: team_ids.iter().map(|t| Value::Integer(*t)).collect(),
        }
    }
}

impl Scope {
    pub fn for_caller(caller: &Caller) -> Self {
        match caller.role.scope_kind() {
            ScopeKind::All => Self::All,
            ScopeKind::Team => Self::Team {
                manager_id: caller.user_id,
                team_ids:   caller.managed_teams.clone(),
            },
            ScopeKind::Own => Self::Own {
                user_id: caller.user_id,
            },
        }
    }

    pub fn permits(&self, owner: &LeadOwner) -> bool {
        match self {
            Self::All => true,
            Self::Team { manager_id, team_ids } => {
                owner.user_id == *manager_id
                    || owner.team_id.is_some_and(|t| team_ids.contains(&t))
            }
            Self::Own { user_id } => owner.user_id == *user_id,
        }
    }

    /// Expects the lead aliased as `l` and its owner as `u`.
    pub fn predicate(&self) -> SqlPredicate {
        match self {
            Self::All => SqlPredicate::always(),
            Self::Team { manager_id, team_ids } => {
                let mut values: Vec<Value> = Vec::with_capacity(team_ids.len() + 1);
                let clause = if team_ids.is_empty() {
                    "l.user_id = ?".to_string()
                } else {
                    let marks = vec!["?"; team_ids.len()].join(", ");
                    values.extend(team_ids.iter().map(|t| Value::Integer(*t)));
                    format!("u.team_id IN ({marks}) OR l.user_id = ?")
                };
                values.push(Value::Integer(*manager_id));
                SqlPredicate { clause, values }
            }
            Self::Own { user_id } => SqlPredicate {
                clause: "l.user_id = ?".into(),
                values: vec![Value::Integer(*user_id)],
            },
        }
    }
}

/// Scope plus the optional team filter from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    pub scope: Scope,
    pub team:  Option<String>,
}

impl Visibility {
    pub fn new(caller: &Caller, team: Option<&str>) -> Self {
        Self {
            scope: Scope::for_caller(caller),
            team:  team.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        }
    }

    pub fn permits(&self, owner: &LeadOwner) -> bool {
        let team_ok = match &self.team {
            None => true,
            Some(team) => owner
                .team_name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(team)),
        };
        team_ok && self.scope.permits(owner)
    }

    pub fn predicate(&self) -> SqlPredicate {
        let base = self.scope.predicate();
        match &self.team {
            None => base,
            Some(team) => base.and(SqlPredicate {
                clause: "u.team_id IN (SELECT id FROM team WHERE name = ? COLLATE NOCASE)".into(),
                values: vec![Value::Text(team.clone())],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn caller(id: UserId, role: Role, managed: Vec<TeamId>) -> Caller {
        Caller {
            user_id: id,
            name: format!("user{id}"),
            role,
            team_id: None,
            managed_teams: managed,
            impersonated_by: None,
        }
    }

    fn owner(user_id: UserId, team: Option<(TeamId, &str)>) -> LeadOwner {
        LeadOwner {
            user_id,
            team_id: team.map(|(id, _)| id),
            team_name: team.map(|(_, n)| n.to_string()),
        }
    }

    #[test]
    fn agent_sees_only_own_leads() {
        let scope = Scope::for_caller(&caller(7, Role::Agent, vec![]));
        assert!(scope.permits(&owner(7, Some((1, "north")))));
        assert!(!scope.permits(&owner(8, Some((1, "north")))));
    }

    #[test]
    fn manager_sees_team_and_own() {
        let scope = Scope::for_caller(&caller(3, Role::Manager, vec![1]));
        assert!(scope.permits(&owner(3, None)));
        assert!(scope.permits(&owner(10, Some((1, "north")))));
        assert!(!scope.permits(&owner(11, Some((2, "south")))));
        assert!(!scope.permits(&owner(12, None)));
    }

    #[test]
    fn read_roles_see_everything() {
        for role in [Role::Admin, Role::Hr, Role::Qa] {
            let scope = Scope::for_caller(&caller(1, role, vec![]));
            assert_eq!(scope, Scope::All);
            assert!(scope.permits(&owner(99, None)));
        }
    }

    #[test]
    fn team_filter_is_anded_with_scope() {
        let admin = caller(1, Role::Admin, vec![]);
        let vis = Visibility::new(&admin, Some("North"));
        assert!(vis.permits(&owner(10, Some((1, "north")))));
        assert!(!vis.permits(&owner(11, Some((2, "south")))));

        let agent = caller(10, Role::Agent, vec![]);
        let vis = Visibility::new(&agent, Some("north"));
        assert!(vis.permits(&owner(10, Some((1, "north")))));
        assert!(!vis.permits(&owner(12, Some((1, "north")))));
    }

    #[test]
    fn blank_team_filter_is_ignored() {
        let admin = caller(1, Role::Admin, vec![]);
        assert_eq!(Visibility::new(&admin, Some("  ")).team, None);
    }

    #[test]
    fn manager_predicate_binds_teams_then_manager() {
        let pred = Scope::for_caller(&caller(3, Role::Manager, vec![4, 5])).predicate();
        assert_eq!(pred.clause, "u.team_id IN (?, ?) OR l.user_id = ?");
        assert_eq!(
            pred.values,
            vec![Value::Integer(4), Value::Integer(5), Value::Integer(3)]
        );
    }

    #[test]
    fn team_members_excludes_manager_and_handles_no_teams() {
        let pred = SqlPredicate::team_members(&[2, 9]);
        assert_eq!(pred.clause, "u.team_id IN (?, ?)");
        assert_eq!(pred.values, vec![Value::Integer(2), Value::Integer(9)]);
        assert_eq!(SqlPredicate::team_members(&[]).clause, "1 = 0");
    }

    #[test]
    fn manager_without_teams_falls_back_to_own() {
        let pred = Scope::for_caller(&caller(3, Role::Manager, vec![])).predicate();
        assert_eq!(pred.clause, "l.user_id = ?");
    }
}
