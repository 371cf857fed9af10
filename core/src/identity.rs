//! Users, teams and the authenticated caller.
//!
//! The desk never authenticates anyone. It receives a user id from the
//! auth collaborator and turns it into a `Caller` via the store.

use crate::{
    role::Role,
    types::{TeamId, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id:         UserId,
    pub name:       String,
    pub email:      String,
    pub role:       Role,
    pub team_id:    Option<TeamId>,
    pub team_name:  Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name:    String,
    pub email:   String,
    pub role:    Role,
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id:         TeamId,
    pub name:       String,
    pub manager_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl TeamRecord {
    /// Team name that older data derived from the manager's name.
    pub fn conventional_name(manager_name: &str) -> String {
        manager_name.trim().to_lowercase()
    }
}

/// The identity every desk operation runs as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id:         UserId,
    pub name:            String,
    pub role:            Role,
    pub team_id:         Option<TeamId>,
    /// Teams this caller manages. Empty for everyone but managers.
    pub managed_teams:   Vec<TeamId>,
    /// Set when an admin is acting as this user.
    pub impersonated_by: Option<UserId>,
}
