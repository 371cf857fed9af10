use crate::{role::Role, status::LeadStatus, types::LeadId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Role '{role}' may not {action}")]
    Forbidden { role: Role, action: String },

    #[error("Lead {lead_id} is outside the caller's scope")]
    NotVisible { lead_id: LeadId },

    #[error("Cannot delete {entity} {id}: referenced by {lead_count} lead(s)")]
    ReferentialIntegrity {
        entity: &'static str,
        id: i64,
        lead_count: i64,
    },

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Status cannot move from '{from}' to '{to}'")]
    IllegalTransition { from: LeadStatus, to: LeadStatus },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeskError {
    pub fn forbidden(role: Role, action: impl Into<String>) -> Self {
        Self::Forbidden {
            role,
            action: action.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable tag for error replies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Database(_)                 => "database",
            Self::Serialization(_)            => "serialization",
            Self::Forbidden { .. }            => "forbidden",
            Self::NotVisible { .. }           => "not_visible",
            Self::ReferentialIntegrity { .. } => "referential_integrity",
            Self::Validation { .. }           => "validation",
            Self::IllegalTransition { .. }    => "illegal_transition",
            Self::NotFound { .. }             => "not_found",
            Self::Other(_)                    => "other",
        }
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
