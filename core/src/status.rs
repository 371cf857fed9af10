//! Lead status lifecycle.
//!
//! RULE: status is a closed set. Every move between statuses goes through
//! `LeadStatus::can_transition_to`; nothing writes a status string directly.
//!
//!   new ──► billable ──► paid
//!
//! plus a lateral move to returned, bad lead or deducted return from any
//! status. A lead in a lateral status may re-enter new, billable or paid.
//! The only blocked moves skip or rewind the main line: new straight to
//! paid, and paid back to new.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadStatus {
    #[serde(rename = "new")]
    New,
    /// Commission owed but not yet paid. Older screens call this "payable".
    #[serde(rename = "billable", alias = "payable")]
    Billable,
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "returned")]
    Returned,
    #[serde(rename = "bad lead", alias = "bad_lead")]
    BadLead,
    #[serde(rename = "deducted return", alias = "deducted_return")]
    DeductedReturn,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 6] = [
        Self::New,
        Self::Billable,
        Self::Paid,
        Self::Returned,
        Self::BadLead,
        Self::DeductedReturn,
    ];

    /// Stable storage name. Matches the CHECK constraint on `lead.status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New            => "new",
            Self::Billable       => "billable",
            Self::Paid           => "paid",
            Self::Returned       => "returned",
            Self::BadLead        => "bad lead",
            Self::DeductedReturn => "deducted return",
        }
    }

    /// Human label as shown on badges and selectors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New            => "New",
            Self::Billable       => "Billable",
            Self::Paid           => "Paid",
            Self::Returned       => "Returned",
            Self::BadLead        => "Bad Lead",
            Self::DeductedReturn => "Deducted Return",
        }
    }

    /// Statuses a lead can be sent to from any other status.
    pub const LATERAL: [LeadStatus; 3] = [Self::Returned, Self::BadLead, Self::DeductedReturn];

    pub fn is_lateral(&self) -> bool {
        Self::LATERAL.contains(self)
    }

    /// Statuses reachable in one step from `self`, in `ALL` order.
    pub fn successors(&self) -> Vec<LeadStatus> {
        Self::ALL
            .into_iter()
            .filter(|next| next != self && self.can_transition_to(*next))
            .collect()
    }

    /// Same-status edits are no-ops and always allowed.
    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        if *self == next || next.is_lateral() || self.is_lateral() {
            return true;
        }
        matches!(
            (self, next),
            (Self::New, Self::Billable)
                | (Self::Billable, Self::New)
                | (Self::Billable, Self::Paid)
                | (Self::Paid, Self::Billable)
        )
    }

    /// Reporting end states. Advisory only; transitions out are still allowed.
    pub fn is_reporting_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::BadLead)
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    /// Case-insensitive; accepts the legacy spellings seen in older data.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', " ");
        match normalized.as_str() {
            "new"                      => Ok(Self::New),
            "billable" | "payable"     => Ok(Self::Billable),
            "paid"                     => Ok(Self::Paid),
            "returned"                 => Ok(Self::Returned),
            "bad lead"                 => Ok(Self::BadLead),
            "deducted return"          => Ok(Self::DeductedReturn),
            other => Err(format!("unknown lead status '{other}'")),
        }
    }
}

/// Whether the call was transferred to the partner center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransferStatus {
    #[serde(rename = "transferred")]
    Transferred,
    #[serde(rename = "not transferred", alias = "not_transferred")]
    NotTransferred,
    #[default]
    #[serde(rename = "awaiting")]
    Awaiting,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transferred    => "transferred",
            Self::NotTransferred => "not transferred",
            Self::Awaiting       => "awaiting",
        }
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', " ").as_str() {
            "transferred"     => Ok(Self::Transferred),
            "not transferred" => Ok(Self::NotTransferred),
            "awaiting"        => Ok(Self::Awaiting),
            other => Err(format!("unknown transfer status '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payable_is_an_alias_for_billable() {
        assert_eq!("payable".parse::<LeadStatus>().unwrap(), LeadStatus::Billable);
        assert_eq!("Billable".parse::<LeadStatus>().unwrap(), LeadStatus::Billable);
        let from_json: LeadStatus = serde_json::from_str("\"payable\"").unwrap();
        assert_eq!(from_json, LeadStatus::Billable);
    }

    #[test]
    fn storage_names_round_trip_through_from_str() {
        for status in LeadStatus::ALL {
            assert_eq!(status.as_str().parse::<LeadStatus>().unwrap(), status);
        }
    }

    #[test]
    fn lateral_statuses_are_reachable_from_everywhere() {
        for from in LeadStatus::ALL {
            for to in LeadStatus::LATERAL {
                assert!(from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn lateral_statuses_can_reenter_the_main_line() {
        for from in LeadStatus::LATERAL {
            assert_eq!(from.successors().len(), 5, "{from}");
        }
        assert!(LeadStatus::BadLead.can_transition_to(LeadStatus::Billable));
        assert!(LeadStatus::DeductedReturn.can_transition_to(LeadStatus::Paid));
    }

    #[test]
    fn main_line_cannot_skip_or_rewind_past_billable() {
        assert!(!LeadStatus::New.can_transition_to(LeadStatus::Paid));
        assert!(!LeadStatus::Paid.can_transition_to(LeadStatus::New));
        assert!(LeadStatus::Paid.can_transition_to(LeadStatus::Billable));
        assert!(LeadStatus::Paid.can_transition_to(LeadStatus::Paid));
    }

    #[test]
    fn paid_and_bad_lead_are_reporting_end_states() {
        let terminal: Vec<_> = LeadStatus::ALL
            .into_iter()
            .filter(|s| s.is_reporting_terminal())
            .collect();
        assert_eq!(terminal, vec![LeadStatus::Paid, LeadStatus::BadLead]);
        assert!(!LeadStatus::BadLead.successors().is_empty());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("approved".parse::<LeadStatus>().is_err());
    }
}
