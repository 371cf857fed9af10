//! Roles and the capability table.
//!
//! RULE: every permission decision in the desk goes through `Role::can`
//! or `Role::may_set_status`. No other module matches on a role to decide
//! what a caller is allowed to do.

use crate::status::LeadStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Hr,
    Manager,
    Agent,
    Qa,
}

/// Everything a caller can attempt against the desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateLead,
    EditStatus,
    EditDetails,
    DeleteLead,
    ManageReference,
    ManageUsers,
    ViewCommissions,
    ViewAuditLog,
    Impersonate,
}

impl Action {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::CreateLead      => "create leads",
            Self::EditStatus      => "edit lead status",
            Self::EditDetails     => "edit lead details",
            Self::DeleteLead      => "delete leads",
            Self::ManageReference => "manage reference data",
            Self::ManageUsers     => "manage users",
            Self::ViewCommissions => "view the commission table",
            Self::ViewAuditLog    => "read the audit log",
            Self::Impersonate     => "impersonate users",
        }
    }
}

/// Which rows a role sees before any filter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    All,
    Team,
    Own,
}

/// Statuses a manager may flag on a lead in their team.
const MANAGER_STATUS_TARGETS: [LeadStatus; 2] = [LeadStatus::Returned, LeadStatus::BadLead];

impl Role {
    pub const ALL: [Role; 5] = [Self::Admin, Self::Hr, Self::Manager, Self::Agent, Self::Qa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin   => "admin",
            Self::Hr      => "hr",
            Self::Manager => "manager",
            Self::Agent   => "agent",
            Self::Qa      => "qa",
        }
    }

    pub fn scope_kind(&self) -> ScopeKind {
        match self {
            Self::Admin | Self::Hr | Self::Qa => ScopeKind::All,
            Self::Manager                     => ScopeKind::Team,
            Self::Agent                       => ScopeKind::Own,
        }
    }

    /// The capability table.
    pub fn can(&self, action: Action) -> bool {
        use Action::*;
        match self {
            Self::Admin => !matches!(action, CreateLead),
            Self::Manager => matches!(action, EditStatus),
            Self::Agent => matches!(action, CreateLead),
            Self::Hr | Self::Qa => false,
        }
    }

    /// Whether this role may request `target` as a new status at all.
    /// The lifecycle check (`LeadStatus::can_transition_to`) still applies.
    pub fn may_set_status(&self, target: LeadStatus) -> bool {
        match self {
            Self::Admin   => true,
            Self::Manager => MANAGER_STATUS_TARGETS.contains(&target),
            _             => false,
        }
    }

    /// Status options to offer on a lead currently in `current`.
    pub fn status_options(&self, current: LeadStatus) -> Vec<LeadStatus> {
        if !self.can(Action::EditStatus) {
            return Vec::new();
        }
        current
            .successors()
            .into_iter()
            .filter(|s| self.may_set_status(*s))
            .collect()
    }

    /// Admin table controls on list views: agent column, team filter, bulk
    /// delete. The status selector follows `Action::EditStatus` instead.
    pub fn has_table_controls(&self) -> bool {
        self.can(Action::DeleteLead)
    }

    pub fn can_be_impersonated(&self) -> bool {
        *self != Self::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin"   => Ok(Self::Admin),
            "hr"      => Ok(Self::Hr),
            "manager" => Ok(Self::Manager),
            "agent"   => Ok(Self::Agent),
            "qa"      => Ok(Self::Qa),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}
