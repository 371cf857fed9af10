//! Audit events.
//!
//! RULE: every mutation the desk performs appends exactly one event to
//! `event_log`, written inside the same transaction as the mutation.
//! Bulk operations write one event carrying every affected id.

use crate::{
    role::Role,
    status::LeadStatus,
    types::{BatchId, LeadId, RefId, TeamId, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every event the desk records.
/// Variants are only appended; stored payloads depend on the tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    // ── Leads ──────────────────────────────────────
    LeadCreated {
        lead_id: LeadId,
        user_id: UserId,
    },
    LeadDetailsUpdated {
        lead_id: LeadId,
    },
    LeadStatusChanged {
        lead_id: LeadId,
        from:    LeadStatus,
        to:      LeadStatus,
    },
    LeadsStatusBulkUpdated {
        status:   LeadStatus,
        lead_ids: Vec<LeadId>,
    },
    LeadsDeleted {
        lead_ids: Vec<LeadId>,
    },

    // ── Reference data ─────────────────────────────
    ReferenceCreated {
        entity: String,
        id:     RefId,
        name:   String,
    },
    ReferenceRenamed {
        entity: String,
        id:     RefId,
        name:   String,
    },
    ReferenceDeleted {
        entity: String,
        ids:    Vec<RefId>,
    },

    // ── Users and teams ────────────────────────────
    UserCreated {
        user_id: UserId,
        role:    Role,
    },
    UserUpdated {
        user_id: UserId,
        role:    Role,
        team_id: Option<TeamId>,
    },
    UserDeleted {
        user_id: UserId,
    },
    TeamCreated {
        team_id:    TeamId,
        name:       String,
        manager_id: UserId,
    },
    ImpersonationStarted {
        admin_id:  UserId,
        target_id: UserId,
    },
}

impl DeskEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::LeadCreated { .. }            => "lead_created",
            Self::LeadDetailsUpdated { .. }     => "lead_details_updated",
            Self::LeadStatusChanged { .. }      => "lead_status_changed",
            Self::LeadsStatusBulkUpdated { .. } => "leads_status_bulk_updated",
            Self::LeadsDeleted { .. }           => "leads_deleted",
            Self::ReferenceCreated { .. }       => "reference_created",
            Self::ReferenceRenamed { .. }       => "reference_renamed",
            Self::ReferenceDeleted { .. }       => "reference_deleted",
            Self::UserCreated { .. }            => "user_created",
            Self::UserUpdated { .. }            => "user_updated",
            Self::UserDeleted { .. }            => "user_deleted",
            Self::TeamCreated { .. }            => "team_created",
            Self::ImpersonationStarted { .. }   => "impersonation_started",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub actor_id:   UserId,
    pub event_type: String,
    pub batch_id:   Option<BatchId>,
    pub payload:    String, // JSON-serialized DeskEvent
    pub created_at: DateTime<Utc>,
}

impl EventLogEntry {
    pub fn new(
        actor_id: UserId,
        event: &DeskEvent,
        batch_id: Option<BatchId>,
        created_at: DateTime<Utc>,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            id: None,
            actor_id,
            event_type: event.type_name().to_string(),
            batch_id,
            payload: serde_json::to_string(event)?,
            created_at,
        })
    }

    pub fn event(&self) -> serde_json::Result<DeskEvent> {
        serde_json::from_str(&self.payload)
    }
}

/// Fire-and-forget message for the notification collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub body:  String,
}
