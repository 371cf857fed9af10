use crate::{
    commission::{Dashboard, UserCommissionRow},
    desk::{BulkOutcome, ImportReport, LeadDesk},
    error::{DeskError, DeskResult},
    event::EventLogEntry,
    identity::{Caller, NewUser, TeamRecord, UserRecord},
    lead::{LeadDetails, LeadRecord},
    role::Role,
    status::LeadStatus,
    store::{RefEntity, ReferenceRecord},
    types::{LeadId, RefId, TeamId, UserId},
    view::{ViewKind, ViewPage, ViewQuery},
};
use serde::{Deserialize, Serialize};

/// Every request the admin panel can send to the desk.
/// Variants are only appended; the IPC protocol depends on the tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DeskCommand {
    // ── Session ───────────────────────────────────
    Whoami,
    Impersonate { user_id: UserId },

    // ── Views ─────────────────────────────────────
    ListView {
        view:  ViewKind,
        #[serde(default)]
        query: ViewQuery,
    },
    GetLead { lead_id: LeadId },
    Export {
        view:     ViewKind,
        #[serde(default)]
        query:    ViewQuery,
        lead_ids: Vec<LeadId>,
    },
    TeamOptions,

    // ── Lead writes ───────────────────────────────
    CreateLead { details: LeadDetails },
    ImportLeads { leads: Vec<LeadDetails> },
    UpdateLead {
        lead_id: LeadId,
        details: LeadDetails,
    },
    SetStatus {
        lead_id: LeadId,
        status:  LeadStatus,
    },
    BulkSetStatus {
        lead_ids: Vec<LeadId>,
        status:   LeadStatus,
    },
    DeleteLead { lead_id: LeadId },
    BulkDelete { lead_ids: Vec<LeadId> },

    // ── Reference data ────────────────────────────
    ListReferences { entity: RefEntity },
    CreateReference {
        entity: RefEntity,
        name:   String,
    },
    RenameReference {
        entity: RefEntity,
        id:     RefId,
        name:   String,
    },
    DeleteReferences {
        entity: RefEntity,
        ids:    Vec<RefId>,
    },

    // ── Users and teams ───────────────────────────
    ListUsers,
    ListTeams,
    CreateUser { user: NewUser },
    UpdateUser {
        user_id: UserId,
        role:    Role,
        team_id: Option<TeamId>,
    },
    DeleteUser { user_id: UserId },
    CreateTeam {
        manager_id: UserId,
        #[serde(default)]
        name:       Option<String>,
    },

    // ── Stats ─────────────────────────────────────
    Dashboard,
    Commissions,
    RecentEvents {
        #[serde(default = "default_event_limit")]
        limit: usize,
    },
}

fn default_event_limit() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "reply", content = "data", rename_all = "snake_case")]
pub enum DeskReply {
    Caller(Caller),
    View(ViewPage),
    Lead(LeadRecord),
    Leads(Vec<LeadRecord>),
    TeamOptions(Vec<String>),
    Created { id: i64 },
    Import(ImportReport),
    StatusChanged {
        lead_id: LeadId,
        from:    LeadStatus,
        to:      LeadStatus,
    },
    Bulk(BulkOutcome),
    Done,
    References(Vec<ReferenceRecord>),
    Users(Vec<UserRecord>),
    Teams(Vec<TeamRecord>),
    Dashboard(Dashboard),
    Commissions(Vec<UserCommissionRow>),
    Events(Vec<EventLogEntry>),
    Error { kind: String, message: String },
}

impl DeskReply {
    pub fn error(err: &DeskError) -> Self {
        Self::Error {
            kind:    err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Run one command as `caller`. A successful `Impersonate` swaps the
/// session's caller for the impersonated one.
pub fn execute(desk: &mut LeadDesk, caller: &mut Caller, command: DeskCommand) -> DeskResult<DeskReply> {
    use DeskCommand as C;
    let reply = match command {
        C::Whoami => DeskReply::Caller(caller.clone()),
        C::Impersonate { user_id } => {
            *caller = desk.impersonate(caller, user_id)?;
            DeskReply::Caller(caller.clone())
        }

        C::ListView { view, query } => DeskReply::View(desk.list_view(caller, view, &query)?),
        C::GetLead { lead_id } => DeskReply::Lead(desk.get_lead(caller, lead_id)?),
        C::Export { view, query, lead_ids } => {
            DeskReply::Leads(desk.select_for_export(caller, view, &query, &lead_ids)?)
        }
        C::TeamOptions => DeskReply::TeamOptions(desk.team_options()?),

        C::CreateLead { details } => DeskReply::Created {
            id: desk.create_lead(caller, &details)?,
        },
        C::ImportLeads { leads } => DeskReply::Import(desk.import_leads(caller, &leads)?),
        C::UpdateLead { lead_id, details } => {
            desk.update_lead_details(caller, lead_id, &details)?;
            DeskReply::Done
        }
        C::SetStatus { lead_id, status } => {
            let from = desk.update_status(caller, lead_id, status)?;
            DeskReply::StatusChanged { lead_id, from, to: status }
        }
        C::BulkSetStatus { lead_ids, status } => {
            DeskReply::Bulk(desk.bulk_update_status(caller, &lead_ids, status)?)
        }
        C::DeleteLead { lead_id } => {
            desk.delete_lead(caller, lead_id)?;
            DeskReply::Done
        }
        C::BulkDelete { lead_ids } => DeskReply::Bulk(desk.bulk_delete(caller, &lead_ids)?),

        C::ListReferences { entity } => DeskReply::References(desk.list_references(entity)?),
        C::CreateReference { entity, name } => DeskReply::Created {
            id: desk.create_reference(caller, entity, &name)?,
        },
        C::RenameReference { entity, id, name } => {
            desk.rename_reference(caller, entity, id, &name)?;
            DeskReply::Done
        }
        C::DeleteReferences { entity, ids } => {
            DeskReply::Bulk(desk.bulk_delete_references(caller, entity, &ids)?)
        }

        C::ListUsers => DeskReply::Users(desk.list_users(caller)?),
        C::ListTeams => DeskReply::Teams(desk.list_teams(caller)?),
        C::CreateUser { user } => DeskReply::Created {
            id: desk.create_user(caller, &user)?,
        },
        C::UpdateUser { user_id, role, team_id } => {
            desk.update_user(caller, user_id, role, team_id)?;
            DeskReply::Done
        }
        C::DeleteUser { user_id } => {
            desk.delete_user(caller, user_id)?;
            DeskReply::Done
        }
        C::CreateTeam { manager_id, name } => DeskReply::Created {
            id: desk.create_team(caller, manager_id, name.as_deref())?,
        },

        C::Dashboard => DeskReply::Dashboard(desk.dashboard(caller)?),
        C::Commissions => DeskReply::Commissions(desk.commission_table(caller)?),
        C::RecentEvents { limit } => DeskReply::Events(desk.recent_events(caller, limit)?),
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Stamp;

    fn seeded() -> (LeadDesk, Caller) {
        let desk = LeadDesk::build_test().unwrap();
        let id = desk
            .store
            .insert_user(
                &NewUser {
                    name: "root".into(),
                    email: "root@desk.test".into(),
                    role: Role::Admin,
                    team_id: None,
                },
                Stamp { actor: 0, at: desk.clock.now() },
            )
            .unwrap();
        let caller = desk.caller(id).unwrap();
        (desk, caller)
    }

    #[test]
    fn commands_parse_from_ipc_json() {
        let cmd: DeskCommand =
            serde_json::from_str(r#"{"cmd":"bulk_set_status","lead_ids":[1,2],"status":"payable"}"#)
                .unwrap();
        assert!(matches!(
            cmd,
            DeskCommand::BulkSetStatus { status: LeadStatus::Billable, .. }
        ));
        let cmd: DeskCommand = serde_json::from_str(r#"{"cmd":"list_view","view":"bad_leads"}"#).unwrap();
        assert!(matches!(cmd, DeskCommand::ListView { view: ViewKind::BadLeads, .. }));
        let cmd: DeskCommand = serde_json::from_str(r#"{"cmd":"recent_events"}"#).unwrap();
        assert!(matches!(cmd, DeskCommand::RecentEvents { limit: 50 }));
    }

    #[test]
    fn execute_creates_reference_and_lists_it() {
        let (mut desk, mut caller) = seeded();
        let reply = execute(
            &mut desk,
            &mut caller,
            DeskCommand::CreateReference {
                entity: RefEntity::Insurance,
                name:   "Aetna".into(),
            },
        )
        .unwrap();
        assert!(matches!(reply, DeskReply::Created { .. }));
        let reply = execute(
            &mut desk,
            &mut caller,
            DeskCommand::ListReferences { entity: RefEntity::Insurance },
        )
        .unwrap();
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["reply"], "references");
        assert_eq!(json["data"][0]["name"], "Aetna");
    }

    #[test]
    fn errors_serialise_with_kind() {
        let (mut desk, mut caller) = seeded();
        let err = execute(&mut desk, &mut caller, DeskCommand::GetLead { lead_id: 9 }).unwrap_err();
        let json = serde_json::to_value(DeskReply::error(&err)).unwrap();
        assert_eq!(json["reply"], "error");
        assert_eq!(json["data"]["kind"], "not_found");
    }
}
