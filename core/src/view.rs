//! Status-scoped list views.
//!
//! One parameterised component serves every list screen. A view is the
//! caller's visibility, ANDed with the view's status filter, ANDed with
//! whatever the request filters on. Rows come back newest id first.

use crate::{
    lead::LeadRecord,
    role::{Action, Role},
    status::LeadStatus,
    types::RefId,
    visibility::{SqlPredicate, Visibility},
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Working queue: everything not yet billed or paid.
    Leads,
    BadLeads,
    Payable,
    Paid,
    Returned,
    DeductedReturn,
}

impl ViewKind {
    pub const ALL: [ViewKind; 6] = [
        Self::Leads,
        Self::BadLeads,
        Self::Payable,
        Self::Paid,
        Self::Returned,
        Self::DeductedReturn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leads          => "leads",
            Self::BadLeads       => "bad_leads",
            Self::Payable        => "payable",
            Self::Paid           => "paid",
            Self::Returned       => "returned",
            Self::DeductedReturn => "deducted_return",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Leads          => "Leads",
            Self::BadLeads       => "Bad Leads",
            Self::Payable        => "Payable",
            Self::Paid           => "Paid Leads",
            Self::Returned       => "Returns",
            Self::DeductedReturn => "Deducted Returns",
        }
    }

    /// Statuses a row must have to appear in this view.
    pub fn statuses(&self) -> &'static [LeadStatus] {
        match self {
            Self::Leads => &[
                LeadStatus::New,
                LeadStatus::Returned,
                LeadStatus::BadLead,
                LeadStatus::DeductedReturn,
            ],
            Self::BadLeads       => &[LeadStatus::BadLead],
            Self::Payable        => &[LeadStatus::Billable],
            Self::Paid           => &[LeadStatus::Paid],
            Self::Returned       => &[LeadStatus::Returned],
            Self::DeductedReturn => &[LeadStatus::DeductedReturn],
        }
    }

    pub fn includes(&self, status: LeadStatus) -> bool {
        self.statuses().contains(&status)
    }

    /// hr is kept out of the Returns screen; every other pair is open.
    pub fn accessible_by(&self, role: Role) -> bool {
        !(role == Role::Hr && *self == Self::Returned)
    }

    pub(crate) fn status_predicate(&self) -> SqlPredicate {
        let statuses = self.statuses();
        SqlPredicate {
            clause: format!("l.status IN ({})", vec!["?"; statuses.len()].join(", ")),
            values: statuses
                .iter()
                .map(|s| Value::Text(s.as_str().to_string()))
                .collect(),
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| format!("unknown view '{s}'"))
    }
}

/// Optional filters from the request. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewQuery {
    pub team:           Option<String>,
    /// Substring match on the owning agent's name.
    pub agent:          Option<String>,
    pub insurance_id:   Option<RefId>,
    pub product_id:     Option<RefId>,
    pub center_code_id: Option<RefId>,
    pub created_on:     Option<NaiveDate>,
}

impl ViewQuery {
    pub fn team(name: &str) -> Self {
        Self {
            team: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Everything but the team filter, which belongs to `Visibility`.
    fn filter_predicate(&self) -> SqlPredicate {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(agent) = self.agent.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            clauses.push("u.name LIKE ?");
            values.push(Value::Text(format!("%{agent}%")));
        }
        for (column, id) in [
            ("l.insurance_id = ?", self.insurance_id),
            ("l.product_id = ?", self.product_id),
            ("l.center_code_id = ?", self.center_code_id),
        ] {
            if let Some(id) = id {
                clauses.push(column);
                values.push(Value::Integer(id));
            }
        }
        if let Some(day) = self.created_on {
            clauses.push("substr(l.created_at, 1, 10) = ?");
            values.push(Value::Text(day.format("%Y-%m-%d").to_string()));
        }

        if clauses.is_empty() {
            SqlPredicate::always()
        } else {
            SqlPredicate {
                clause: clauses.join(" AND "),
                values,
            }
        }
    }
}

/// The full WHERE clause for `kind` as seen through `visibility`.
pub fn view_predicate(visibility: &Visibility, kind: ViewKind, query: &ViewQuery) -> SqlPredicate {
    visibility
        .predicate()
        .and(kind.status_predicate())
        .and(query.filter_predicate())
}

/// How the status column renders for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusCell {
    /// Editable: `options` are the legal targets from the current status.
    Selector {
        current: LeadStatus,
        options: Vec<LeadStatus>,
    },
    Badge {
        status: LeadStatus,
        label:  String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewColumns {
    pub agent:       bool,
    pub team_filter: bool,
    pub bulk_delete: bool,
}

impl ViewColumns {
    pub fn for_role(role: Role) -> Self {
        let full = role.has_table_controls();
        Self {
            agent:       full,
            team_filter: full,
            bulk_delete: full,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub lead:   LeadRecord,
    pub status: StatusCell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewPage {
    pub kind:         ViewKind,
    pub title:        String,
    pub columns:      ViewColumns,
    /// Team names for the filter dropdown; empty unless `columns.team_filter`.
    pub team_options: Vec<String>,
    pub rows:         Vec<ViewRow>,
}

impl ViewPage {
    pub fn build(kind: ViewKind, role: Role, leads: Vec<LeadRecord>, team_options: Vec<String>) -> Self {
        let columns = ViewColumns::for_role(role);
        let rows = leads
            .into_iter()
            .map(|lead| ViewRow {
                status: status_cell(role, lead.status),
                lead,
            })
            .collect();
        Self {
            kind,
            title: kind.title().to_string(),
            columns,
            team_options: if columns.team_filter { team_options } else { Vec::new() },
            rows,
        }
    }

    pub fn lead_ids(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.lead.id).collect()
    }
}

fn status_cell(role: Role, status: LeadStatus) -> StatusCell {
    if role.can(Action::EditStatus) {
        StatusCell::Selector {
            current: status,
            options: role.status_options(status),
        }
    } else {
        StatusCell::Badge {
            status,
            label: status.label().to_string(),
        }
    }
}
