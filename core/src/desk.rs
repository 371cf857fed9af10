//! The lead desk: every request from the admin panel goes through here.
//!
//! ORDER OF CHECKS (fixed for every mutation):
//!   1. Capability   (`Role::can`, `Role::may_set_status`)
//!   2. Visibility   (every targeted lead must be in the caller's scope)
//!   3. Lifecycle    (`LeadStatus::can_transition_to`)
//!   4. Store write  (one transaction, one audit event)
//!
//! Nothing is written until all checks for the whole request pass.

use crate::{
    cache::TtlCache,
    clock::DeskClock,
    commission::{self, Dashboard, UserCommissionRow},
    config::DeskConfig,
    error::{DeskError, DeskResult},
    event::{DeskEvent, EventLogEntry, Notice},
    identity::{Caller, NewUser, TeamRecord, UserRecord},
    lead::{validate_reference_name, LeadDetails, LeadRecord},
    role::{Action, Role},
    status::LeadStatus,
    store::{DeskStore, RefEntity, ReferenceRecord, Stamp},
    types::{BatchId, LeadId, RefId, TeamId, UserId},
    view::{view_predicate, ViewKind, ViewPage, ViewQuery},
    visibility::{Scope, SqlPredicate, Visibility},
};
use chrono::{Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result of a bulk mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub batch_id: BatchId,
    pub affected: usize,
    pub notice:   Notice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportFailure {
    /// Position of the record in the submitted batch.
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: Vec<LeadId>,
    pub failed:  Vec<ImportFailure>,
    pub notice:  Notice,
}

pub struct LeadDesk {
    pub store:  DeskStore,
    pub config: DeskConfig,
    pub clock:  DeskClock,
    team_cache: TtlCache<Vec<String>>,
}

impl LeadDesk {
    pub fn new(store: DeskStore, config: DeskConfig, clock: DeskClock) -> Self {
        let ttl = Duration::seconds(config.settings.team_cache_ttl_secs);
        Self {
            store,
            config,
            clock,
            team_cache: TtlCache::new(ttl),
        }
    }

    /// In-memory, migrated desk on a fixed clock, for tests.
    pub fn build_test() -> DeskResult<Self> {
        let store = DeskStore::in_memory()?;
        store.migrate()?;
        let start = Utc
            .with_ymd_and_hms(2026, 10, 1, 9, 0, 0)
            .single()
            .ok_or_else(|| anyhow::anyhow!("invalid test clock start"))?;
        Ok(Self::new(store, DeskConfig::default_test(), DeskClock::Fixed(start)))
    }

    /// Audit events name the person at the keyboard, so an impersonating
    /// admin is recorded as the actor.
    fn stamp(&self, caller: &Caller) -> Stamp {
        Stamp {
            actor: caller.impersonated_by.unwrap_or(caller.user_id),
            at:    self.clock.now(),
        }
    }

    fn chunk_size(&self) -> usize {
        self.config.settings.bulk_chunk_size
    }

    fn require(&self, caller: &Caller, action: Action) -> DeskResult<()> {
        if caller.role.can(action) {
            Ok(())
        } else {
            log::warn!(
                "desk: user {} ({}) refused: {}",
                caller.user_id,
                caller.role,
                action.describe()
            );
            Err(DeskError::forbidden(caller.role, action.describe()))
        }
    }

    /// Fetch a lead the caller may see. Leads outside the scope are
    /// reported as not visible rather than not found.
    fn visible_lead(&self, caller: &Caller, lead_id: LeadId) -> DeskResult<LeadRecord> {
        let lead = self
            .store
            .get_lead(lead_id)?
            .ok_or(DeskError::NotFound { entity: "lead", id: lead_id })?;
        if !Scope::for_caller(caller).permits(&lead.owner()) {
            log::warn!("desk: user {} cannot see lead {lead_id}", caller.user_id);
            return Err(DeskError::NotVisible { lead_id });
        }
        Ok(lead)
    }

    /// Every id, each visible to the caller. Duplicates are dropped,
    /// first occurrence wins.
    fn visible_batch(&self, caller: &Caller, lead_ids: &[LeadId]) -> DeskResult<Vec<LeadRecord>> {
        if lead_ids.is_empty() {
            return Err(DeskError::validation("lead_ids", "select at least one lead"));
        }
        let mut seen = HashSet::new();
        let mut leads = Vec::with_capacity(lead_ids.len());
        for &id in lead_ids {
            if seen.insert(id) {
                leads.push(self.visible_lead(caller, id)?);
            }
        }
        Ok(leads)
    }

    fn new_batch_id() -> BatchId {
        uuid::Uuid::new_v4().to_string()
    }

    // ── Callers ────────────────────────────────────────────────────

    pub fn caller(&self, user_id: UserId) -> DeskResult<Caller> {
        self.store.caller_for(user_id)
    }

    /// Act as `target_id`. The returned caller carries the target's role
    /// and scope and remembers the admin behind it.
    pub fn impersonate(&self, admin: &Caller, target_id: UserId) -> DeskResult<Caller> {
        self.require(admin, Action::Impersonate)?;
        if admin.impersonated_by.is_some() {
            return Err(DeskError::forbidden(admin.role, "impersonate while impersonating"));
        }
        let mut target = self.store.caller_for(target_id)?;
        if !target.role.can_be_impersonated() {
            log::warn!("desk: user {} tried to impersonate admin {target_id}", admin.user_id);
            return Err(DeskError::forbidden(admin.role, "impersonate an admin"));
        }
        target.impersonated_by = Some(admin.user_id);
        self.store.record(
            self.stamp(admin),
            &DeskEvent::ImpersonationStarted {
                admin_id:  admin.user_id,
                target_id,
            },
            None,
        )?;
        log::info!("desk: admin {} now acting as user {target_id}", admin.user_id);
        Ok(target)
    }

    // ── Views ──────────────────────────────────────────────────────

    pub fn list_view(
        &mut self,
        caller: &Caller,
        kind: ViewKind,
        query: &ViewQuery,
    ) -> DeskResult<ViewPage> {
        let leads = self.view_leads(caller, kind, query)?;
        let team_options = if caller.role.has_table_controls() {
            self.team_options()?
        } else {
            Vec::new()
        };
        log::debug!(
            "desk: {} view for user {} returned {} rows",
            kind,
            caller.user_id,
            leads.len()
        );
        Ok(ViewPage::build(kind, caller.role, leads, team_options))
    }

    fn view_leads(
        &self,
        caller: &Caller,
        kind: ViewKind,
        query: &ViewQuery,
    ) -> DeskResult<Vec<LeadRecord>> {
        if !kind.accessible_by(caller.role) {
            log::warn!("desk: {} may not open the {kind} view", caller.role);
            return Err(DeskError::forbidden(
                caller.role,
                format!("open the {} view", kind.title()),
            ));
        }
        let visibility = Visibility::new(caller, query.team.as_deref());
        self.store
            .query_leads(&view_predicate(&visibility, kind, query))
    }

    /// Rows of the caller's view restricted to `lead_ids`, in view order.
    /// Ids outside the view are silently left out.
    pub fn select_for_export(
        &self,
        caller: &Caller,
        kind: ViewKind,
        query: &ViewQuery,
        lead_ids: &[LeadId],
    ) -> DeskResult<Vec<LeadRecord>> {
        let wanted: HashSet<LeadId> = lead_ids.iter().copied().collect();
        let rows: Vec<LeadRecord> = self
            .view_leads(caller, kind, query)?
            .into_iter()
            .filter(|lead| wanted.contains(&lead.id))
            .collect();
        log::info!(
            "desk: user {} exported {} of {} selected leads",
            caller.user_id,
            rows.len(),
            wanted.len()
        );
        Ok(rows)
    }

    /// Team names for the filter dropdown. Cached on the desk clock and
    /// never invalidated by writes.
    pub fn team_options(&mut self) -> DeskResult<Vec<String>> {
        let now = self.clock.now();
        let store = &self.store;
        self.team_cache
            .get_or_load(now, || store.team_names_in_use())
    }

    pub fn get_lead(&self, caller: &Caller, lead_id: LeadId) -> DeskResult<LeadRecord> {
        self.visible_lead(caller, lead_id)
    }

    // ── Lead writes ────────────────────────────────────────────────

    pub fn create_lead(&self, caller: &Caller, details: &LeadDetails) -> DeskResult<LeadId> {
        self.require(caller, Action::CreateLead)?;
        details.validate()?;
        let lead_id = self
            .store
            .insert_lead(caller.user_id, details, self.stamp(caller))?;
        log::info!("desk: user {} created lead {lead_id}", caller.user_id);
        Ok(lead_id)
    }

    /// Create every valid record. Per-record validation failures are
    /// reported and skipped; anything else aborts the import.
    pub fn import_leads(&self, caller: &Caller, forms: &[LeadDetails]) -> DeskResult<ImportReport> {
        self.require(caller, Action::CreateLead)?;
        let mut created = Vec::new();
        let mut failed = Vec::new();
        for (index, details) in forms.iter().enumerate() {
            let result = details
                .validate()
                .and_then(|_| self.store.insert_lead(caller.user_id, details, self.stamp(caller)));
            match result {
                Ok(id) => created.push(id),
                Err(err @ (DeskError::Validation { .. } | DeskError::NotFound { .. })) => {
                    log::debug!("desk: import record {index} skipped: {err}");
                    failed.push(ImportFailure {
                        index,
                        error: err.to_string(),
                    });
                }
                Err(other) => return Err(other),
            }
        }
        log::info!(
            "desk: user {} imported {} leads, {} rejected",
            caller.user_id,
            created.len(),
            failed.len()
        );
        let notice = Notice {
            title: "Import Completed".into(),
            body:  format!(
                "Imported {} records. {} failed.",
                created.len(),
                failed.len()
            ),
        };
        Ok(ImportReport { created, failed, notice })
    }

    pub fn update_lead_details(
        &self,
        caller: &Caller,
        lead_id: LeadId,
        details: &LeadDetails,
    ) -> DeskResult<()> {
        self.require(caller, Action::EditDetails)?;
        self.visible_lead(caller, lead_id)?;
        details.validate()?;
        self.store
            .update_lead_details(lead_id, details, self.stamp(caller))?;
        log::info!("desk: user {} updated lead {lead_id}", caller.user_id);
        Ok(())
    }

    /// Capability, then status permission, then the lifecycle table.
    fn check_status_change(&self, caller: &Caller, lead: &LeadRecord, to: LeadStatus) -> DeskResult<()> {
        if lead.status == to {
            return Ok(());
        }
        if !caller.role.may_set_status(to) {
            log::warn!("desk: {} may not set status '{to}'", caller.role);
            return Err(DeskError::forbidden(caller.role, format!("set status to '{to}'")));
        }
        if !lead.status.can_transition_to(to) {
            return Err(DeskError::IllegalTransition { from: lead.status, to });
        }
        Ok(())
    }

    /// Returns the status the lead had before the edit.
    pub fn update_status(&self, caller: &Caller, lead_id: LeadId, to: LeadStatus) -> DeskResult<LeadStatus> {
        self.require(caller, Action::EditStatus)?;
        let lead = self.visible_lead(caller, lead_id)?;
        self.check_status_change(caller, &lead, to)?;
        if lead.status == to {
            log::debug!("desk: lead {lead_id} already '{to}'");
            return Ok(lead.status);
        }
        self.store
            .set_lead_status(lead_id, lead.status, to, self.stamp(caller))?;
        log::info!(
            "desk: user {} moved lead {lead_id} '{}' -> '{to}'",
            caller.user_id,
            lead.status
        );
        Ok(lead.status)
    }

    /// All or nothing: one refused lead aborts the whole batch.
    pub fn bulk_update_status(
        &self,
        caller: &Caller,
        lead_ids: &[LeadId],
        to: LeadStatus,
    ) -> DeskResult<BulkOutcome> {
        self.require(caller, Action::EditStatus)?;
        let leads = self.visible_batch(caller, lead_ids)?;
        for lead in &leads {
            self.check_status_change(caller, lead, to)?;
        }
        let ids: Vec<LeadId> = leads.iter().map(|l| l.id).collect();
        let batch_id = Self::new_batch_id();
        let affected = self.store.bulk_set_status(
            &ids,
            to,
            self.chunk_size(),
            self.stamp(caller),
            &batch_id,
        )?;
        log::info!(
            "desk: user {} set '{to}' on {affected} leads (batch {batch_id})",
            caller.user_id
        );
        Ok(BulkOutcome {
            batch_id,
            affected,
            notice: Notice {
                title: "Status Updated".into(),
                body:  format!("Status updated successfully for {affected} records."),
            },
        })
    }

    pub fn delete_lead(&self, caller: &Caller, lead_id: LeadId) -> DeskResult<()> {
        self.require(caller, Action::DeleteLead)?;
        self.visible_lead(caller, lead_id)?;
        self.store
            .delete_leads(&[lead_id], self.chunk_size(), self.stamp(caller), None)?;
        log::info!("desk: user {} deleted lead {lead_id}", caller.user_id);
        Ok(())
    }

    pub fn bulk_delete(&self, caller: &Caller, lead_ids: &[LeadId]) -> DeskResult<BulkOutcome> {
        self.require(caller, Action::DeleteLead)?;
        let ids: Vec<LeadId> = self
            .visible_batch(caller, lead_ids)?
            .iter()
            .map(|l| l.id)
            .collect();
        let batch_id = Self::new_batch_id();
        let affected = self.store.delete_leads(
            &ids,
            self.chunk_size(),
            self.stamp(caller),
            Some(&batch_id),
        )?;
        log::info!(
            "desk: user {} deleted {affected} leads (batch {batch_id})",
            caller.user_id
        );
        Ok(BulkOutcome {
            batch_id,
            affected,
            notice: Notice {
                title: "Leads Deleted".into(),
                body:  format!("Deleted {affected} records."),
            },
        })
    }

    // ── Reference data ─────────────────────────────────────────────

    /// Any caller may read reference lists; the lead form needs them.
    pub fn list_references(&self, entity: RefEntity) -> DeskResult<Vec<ReferenceRecord>> {
        self.store.list_references(entity)
    }

    pub fn create_reference(&self, caller: &Caller, entity: RefEntity, name: &str) -> DeskResult<RefId> {
        self.require(caller, Action::ManageReference)?;
        validate_reference_name(name)?;
        let id = self
            .store
            .insert_reference(entity, name, self.stamp(caller))?;
        log::info!("desk: created {entity} {id} '{}'", name.trim());
        Ok(id)
    }

    pub fn rename_reference(
        &self,
        caller: &Caller,
        entity: RefEntity,
        id: RefId,
        name: &str,
    ) -> DeskResult<()> {
        self.require(caller, Action::ManageReference)?;
        validate_reference_name(name)?;
        self.store
            .rename_reference(entity, id, name, self.stamp(caller))?;
        log::info!("desk: renamed {entity} {id} to '{}'", name.trim());
        Ok(())
    }

    pub fn delete_reference(&self, caller: &Caller, entity: RefEntity, id: RefId) -> DeskResult<()> {
        self.require(caller, Action::ManageReference)?;
        self.store
            .delete_references(entity, &[id], self.stamp(caller))?;
        log::info!("desk: deleted {entity} {id}");
        Ok(())
    }

    /// Deletes every id or none; the first referenced row aborts the batch.
    pub fn bulk_delete_references(
        &self,
        caller: &Caller,
        entity: RefEntity,
        ids: &[RefId],
    ) -> DeskResult<BulkOutcome> {
        self.require(caller, Action::ManageReference)?;
        let affected = self
            .store
            .delete_references(entity, ids, self.stamp(caller))?;
        log::info!("desk: deleted {affected} {entity} rows");
        Ok(BulkOutcome {
            batch_id: Self::new_batch_id(),
            affected,
            notice: Notice {
                title: "Deleted".into(),
                body:  format!("Deleted {affected} {entity} records."),
            },
        })
    }

    // ── Users and teams ────────────────────────────────────────────

    pub fn list_users(&self, caller: &Caller) -> DeskResult<Vec<UserRecord>> {
        self.require(caller, Action::ManageUsers)?;
        self.store.list_users()
    }

    pub fn list_teams(&self, caller: &Caller) -> DeskResult<Vec<TeamRecord>> {
        self.require(caller, Action::ManageUsers)?;
        self.store.list_teams()
    }

    pub fn create_user(&self, caller: &Caller, user: &NewUser) -> DeskResult<UserId> {
        self.require(caller, Action::ManageUsers)?;
        if user.name.trim().is_empty() {
            return Err(DeskError::validation("name", "is required"));
        }
        if !user.email.contains('@') {
            return Err(DeskError::validation("email", "must be an email address"));
        }
        let user_id = self.store.insert_user(user, self.stamp(caller))?;
        log::info!("desk: created {} user {user_id}", user.role);
        Ok(user_id)
    }

    pub fn update_user(
        &self,
        caller: &Caller,
        user_id: UserId,
        role: Role,
        team_id: Option<TeamId>,
    ) -> DeskResult<()> {
        self.require(caller, Action::ManageUsers)?;
        self.store
            .update_user(user_id, role, team_id, self.stamp(caller))?;
        log::info!("desk: user {user_id} is now {role} in team {team_id:?}");
        Ok(())
    }

    pub fn delete_user(&self, caller: &Caller, user_id: UserId) -> DeskResult<()> {
        self.require(caller, Action::ManageUsers)?;
        if user_id == caller.user_id {
            return Err(DeskError::validation("user", "cannot delete yourself"));
        }
        self.store.delete_user(user_id, self.stamp(caller))?;
        log::info!("desk: deleted user {user_id}");
        Ok(())
    }

    /// `name` defaults to the manager's lowercased name.
    pub fn create_team(
        &self,
        caller: &Caller,
        manager_id: UserId,
        name: Option<&str>,
    ) -> DeskResult<TeamId> {
        self.require(caller, Action::ManageUsers)?;
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => {
                let manager = self
                    .store
                    .get_user(manager_id)?
                    .ok_or(DeskError::NotFound { entity: "user", id: manager_id })?;
                TeamRecord::conventional_name(&manager.name)
            }
        };
        let team_id = self
            .store
            .insert_team(&name, manager_id, self.stamp(caller))?;
        log::info!("desk: created team {team_id} '{name}' for manager {manager_id}");
        Ok(team_id)
    }

    // ── Dashboards ─────────────────────────────────────────────────

    /// The dashboard for the caller's role, over the caller's scope.
    pub fn dashboard(&self, caller: &Caller) -> DeskResult<Dashboard> {
        let rates = &self.config.commission;
        let today = self.clock.now().date_naive();
        let window = self.config.settings.trend_window_days.max(1);
        let first_day = today - Duration::days(window - 1);
        let since = first_day
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .ok_or_else(|| anyhow::anyhow!("invalid trend start {first_day}"))?;
        let trend = |filter: &SqlPredicate| -> DeskResult<_> {
            let sparse = self.store.daily_lead_counts(filter, since)?;
            Ok(commission::dense_trend(&sparse, first_day, today))
        };

        let dashboard = match caller.role {
            Role::Admin | Role::Hr => {
                let counts = self.store.status_counts(&SqlPredicate::always())?;
                let paid = ViewKind::Paid.status_predicate();
                commission::overview_dashboard(&counts, &trend(&paid)?, rates)
            }
            Role::Manager => {
                let members = SqlPredicate::team_members(&caller.managed_teams);
                let counts = self.store.status_counts(&members)?;
                commission::team_dashboard(&counts, &trend(&members)?, rates)
            }
            Role::Agent => {
                let own = Scope::for_caller(caller).predicate();
                let counts = self.store.status_counts(&own)?;
                commission::agent_dashboard(&counts, &trend(&own)?, rates)
            }
            Role::Qa => {
                let all = SqlPredicate::always();
                let counts = self.store.status_counts(&all)?;
                commission::qa_dashboard(&counts, &trend(&all)?, rates)
            }
        };
        log::debug!("desk: built {} dashboard for user {}", caller.role, caller.user_id);
        Ok(dashboard)
    }

    pub fn commission_table(&self, caller: &Caller) -> DeskResult<Vec<UserCommissionRow>> {
        self.require(caller, Action::ViewCommissions)?;
        let rates = &self.config.commission;
        Ok(self
            .store
            .user_lead_counts()?
            .iter()
            .map(|counts| commission::commission_row(counts, rates))
            .collect())
    }

    pub fn recent_events(&self, caller: &Caller, limit: usize) -> DeskResult<Vec<EventLogEntry>> {
        self.require(caller, Action::ViewAuditLog)?;
        self.store.recent_events(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::fixtures;

    struct Fixture {
        desk:    LeadDesk,
        admin:   Caller,
        manager: Caller,
        agent:   Caller,
        other:   Caller,
        refs:    (RefId, RefId, RefId),
    }

    fn user(desk: &LeadDesk, name: &str, role: Role, team_id: Option<TeamId>) -> UserId {
        desk.store
            .insert_user(
                &NewUser {
                    name: name.into(),
                    email: format!("{name}@desk.test"),
                    role,
                    team_id,
                },
                Stamp { actor: 0, at: desk.clock.now() },
            )
            .unwrap()
    }

    fn fixture() -> Fixture {
        let desk = LeadDesk::build_test().unwrap();
        let admin_id = user(&desk, "root", Role::Admin, None);
        let admin = desk.caller(admin_id).unwrap();
        let mgr_id = user(&desk, "north", Role::Manager, None);
        let team = desk.create_team(&admin, mgr_id, None).unwrap();
        let agent_id = user(&desk, "ali", Role::Agent, Some(team));
        let other_id = user(&desk, "zed", Role::Agent, None);
        let refs = (
            desk.create_reference(&admin, RefEntity::Insurance, "Humana").unwrap(),
            desk.create_reference(&admin, RefEntity::Product, "Knee Brace").unwrap(),
            desk.create_reference(&admin, RefEntity::CenterCode, "C-100").unwrap(),
        );
        Fixture {
            manager: desk.caller(mgr_id).unwrap(),
            agent: desk.caller(agent_id).unwrap(),
            other: desk.caller(other_id).unwrap(),
            desk,
            admin,
            refs,
        }
    }

    fn lead(f: &Fixture, who: &Caller, n: u32) -> LeadId {
        let (i, p, c) = f.refs;
        f.desk.create_lead(who, &fixtures::details(n, i, p, c)).unwrap()
    }

    #[test]
    fn admin_cannot_create_leads() {
        let f = fixture();
        let (i, p, c) = f.refs;
        assert!(matches!(
            f.desk.create_lead(&f.admin, &fixtures::details(1, i, p, c)),
            Err(DeskError::Forbidden { role: Role::Admin, .. })
        ));
    }

    #[test]
    fn agent_cannot_read_someone_elses_lead() {
        let f = fixture();
        let id = lead(&f, &f.other, 1);
        assert!(matches!(
            f.desk.get_lead(&f.agent, id),
            Err(DeskError::NotVisible { lead_id }) if lead_id == id
        ));
        assert!(f.desk.get_lead(&f.admin, id).is_ok());
    }

    #[test]
    fn manager_flags_team_lead_but_not_outside() {
        let f = fixture();
        let mine = lead(&f, &f.agent, 1);
        let outside = lead(&f, &f.other, 2);
        f.desk.update_status(&f.manager, mine, LeadStatus::BadLead).unwrap();
        assert_eq!(f.desk.get_lead(&f.admin, mine).unwrap().status, LeadStatus::BadLead);
        assert!(matches!(
            f.desk.update_status(&f.manager, outside, LeadStatus::BadLead),
            Err(DeskError::NotVisible { .. })
        ));
        assert!(matches!(
            f.desk.update_status(&f.manager, mine, LeadStatus::New),
            Err(DeskError::Forbidden { .. })
        ));
    }

    #[test]
    fn illegal_transition_is_rejected_and_noop_accepted() {
        let f = fixture();
        let id = lead(&f, &f.agent, 1);
        assert!(matches!(
            f.desk.update_status(&f.admin, id, LeadStatus::Paid),
            Err(DeskError::IllegalTransition { from: LeadStatus::New, to: LeadStatus::Paid })
        ));
        assert_eq!(f.desk.update_status(&f.admin, id, LeadStatus::New).unwrap(), LeadStatus::New);
        assert_eq!(f.desk.store.events_of_type("lead_status_changed").unwrap(), 0);

        assert_eq!(
            f.desk.update_status(&f.admin, id, LeadStatus::DeductedReturn).unwrap(),
            LeadStatus::New
        );
        f.desk.update_status(&f.admin, id, LeadStatus::Paid).unwrap();
        assert_eq!(f.desk.store.events_of_type("lead_status_changed").unwrap(), 2);
    }

    #[test]
    fn impersonated_actions_are_recorded_against_the_admin() {
        let f = fixture();
        let as_agent = f.desk.impersonate(&f.admin, f.agent.user_id).unwrap();
        assert_eq!(as_agent.role, Role::Agent);
        assert_eq!(as_agent.impersonated_by, Some(f.admin.user_id));
        lead(&f, &as_agent, 1);
        let latest = &f.desk.store.recent_events(1).unwrap()[0];
        assert_eq!(latest.event_type, "lead_created");
        assert_eq!(latest.actor_id, f.admin.user_id);
    }

    #[test]
    fn bulk_status_dedupes_ids() {
        let f = fixture();
        let a = lead(&f, &f.agent, 1);
        let b = lead(&f, &f.agent, 2);
        let out = f
            .desk
            .bulk_update_status(&f.admin, &[a, b, a], LeadStatus::Billable)
            .unwrap();
        assert_eq!(out.affected, 2);
        assert_eq!(out.notice.body, "Status updated successfully for 2 records.");
        assert!(matches!(
            f.desk.bulk_update_status(&f.admin, &[], LeadStatus::Billable),
            Err(DeskError::Validation { .. })
        ));
    }

    #[test]
    fn create_team_defaults_to_manager_name() {
        let f = fixture();
        let teams = f.desk.list_teams(&f.admin).unwrap();
        assert_eq!(teams[0].name, "north");
        assert!(f.desk.list_teams(&f.manager).is_err());
    }

    #[test]
    fn audit_log_is_admin_only() {
        let f = fixture();
        assert!(!f.desk.recent_events(&f.admin, 5).unwrap().is_empty());
        assert!(matches!(
            f.desk.recent_events(&f.manager, 5),
            Err(DeskError::Forbidden { role: Role::Manager, .. })
        ));
    }
}
