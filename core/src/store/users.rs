use super::{parse_enum, parse_ts, ts, unique_violation, DeskStore, Stamp};
use crate::{
    error::{DeskError, DeskResult},
    event::DeskEvent,
    identity::{Caller, NewUser, TeamRecord, UserRecord},
    role::Role,
    types::{TeamId, UserId},
};
use rusqlite::{params, OptionalExtension};

const USER_SELECT: &str =
    "SELECT u.id, u.name, u.email, u.role, u.team_id, t.name, u.created_at
     FROM app_user u LEFT JOIN team t ON t.id = u.team_id";

fn user_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id:         row.get(0)?,
        name:       row.get(1)?,
        email:      row.get(2)?,
        role:       parse_enum(3, row.get(3)?)?,
        team_id:    row.get(4)?,
        team_name:  row.get(5)?,
        created_at: parse_ts(6, row.get(6)?)?,
    })
}

impl DeskStore {
    // ── Users ──────────────────────────────────────────────────────

    pub fn insert_user(&self, user: &NewUser, stamp: Stamp) -> DeskResult<UserId> {
        let tx = self.conn.unchecked_transaction()?;
        if let Some(team_id) = user.team_id {
            self.require_team(team_id)?;
        }
        self.conn
            .execute(
                "INSERT INTO app_user (name, email, role, team_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.name.trim(),
                    user.email.trim(),
                    user.role.as_str(),
                    user.team_id,
                    ts(&stamp.at),
                ],
            )
            .map_err(|e| unique_violation(e, "email", "is already registered"))?;
        let user_id = self.conn.last_insert_rowid();
        self.record(
            stamp,
            &DeskEvent::UserCreated {
                user_id,
                role: user.role,
            },
            None,
        )?;
        tx.commit()?;
        Ok(user_id)
    }

    pub fn get_user(&self, user_id: UserId) -> DeskResult<Option<UserRecord>> {
        self.conn
            .query_row(
                &format!("{USER_SELECT} WHERE u.id = ?1"),
                params![user_id],
                user_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_users(&self) -> DeskResult<Vec<UserRecord>> {
        let mut stmt = self.conn.prepare(&format!("{USER_SELECT} ORDER BY u.name ASC"))?;
        let rows = stmt.query_map([], user_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_user(
        &self,
        user_id: UserId,
        role: Role,
        team_id: Option<TeamId>,
        stamp: Stamp,
    ) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        if let Some(team_id) = team_id {
            self.require_team(team_id)?;
        }
        let changed = self.conn.execute(
            "UPDATE app_user SET role = ?1, team_id = ?2 WHERE id = ?3",
            params![role.as_str(), team_id, user_id],
        )?;
        if changed == 0 {
            return Err(DeskError::NotFound { entity: "user", id: user_id });
        }
        self.record(stamp, &DeskEvent::UserUpdated { user_id, role, team_id }, None)?;
        tx.commit()?;
        Ok(())
    }

    /// Refused while the user owns leads or manages a team.
    pub fn delete_user(&self, user_id: UserId, stamp: Stamp) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let lead_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lead WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        if lead_count > 0 {
            return Err(DeskError::ReferentialIntegrity {
                entity: "user",
                id: user_id,
                lead_count,
            });
        }
        if !self.teams_managed_by(user_id)?.is_empty() {
            return Err(DeskError::validation("user", "still manages a team"));
        }
        let changed = self
            .conn
            .execute("DELETE FROM app_user WHERE id = ?1", params![user_id])?;
        if changed == 0 {
            return Err(DeskError::NotFound { entity: "user", id: user_id });
        }
        self.record(stamp, &DeskEvent::UserDeleted { user_id }, None)?;
        tx.commit()?;
        Ok(())
    }

    // ── Teams ──────────────────────────────────────────────────────

    pub fn insert_team(&self, name: &str, manager_id: UserId, stamp: Stamp) -> DeskResult<TeamId> {
        let tx = self.conn.unchecked_transaction()?;
        let manager = self
            .get_user(manager_id)?
            .ok_or(DeskError::NotFound { entity: "user", id: manager_id })?;
        if manager.role != Role::Manager {
            return Err(DeskError::validation("manager_id", "must reference a manager"));
        }
        let name = name.trim().to_lowercase();
        self.conn
            .execute(
                "INSERT INTO team (name, manager_id, created_at) VALUES (?1, ?2, ?3)",
                params![name, manager_id, ts(&stamp.at)],
            )
            .map_err(|e| unique_violation(e, "name", "team already exists"))?;
        let team_id = self.conn.last_insert_rowid();
        self.record(
            stamp,
            &DeskEvent::TeamCreated {
                team_id,
                name,
                manager_id,
            },
            None,
        )?;
        tx.commit()?;
        Ok(team_id)
    }

    pub fn list_teams(&self) -> DeskResult<Vec<TeamRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, manager_id, created_at FROM team ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TeamRecord {
                id:         row.get(0)?,
                name:       row.get(1)?,
                manager_id: row.get(2)?,
                created_at: parse_ts(3, row.get(3)?)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn teams_managed_by(&self, manager_id: UserId) -> DeskResult<Vec<TeamId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM team WHERE manager_id = ?1 ORDER BY id ASC")?;
        let rows = stmt.query_map(params![manager_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Names of teams that have at least one member, for filter dropdowns.
    pub fn team_names_in_use(&self) -> DeskResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT t.name FROM team t
             JOIN app_user u ON u.team_id = t.id
             ORDER BY t.name ASC",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn require_team(&self, team_id: TeamId) -> DeskResult<()> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM team WHERE id = ?1)",
            params![team_id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(DeskError::NotFound { entity: "team", id: team_id })
        }
    }

    // ── Callers ────────────────────────────────────────────────────

    /// Resolve an authenticated user id into the identity the desk acts as.
    pub fn caller_for(&self, user_id: UserId) -> DeskResult<Caller> {
        let user = self
            .get_user(user_id)?
            .ok_or(DeskError::NotFound { entity: "user", id: user_id })?;
        let managed_teams = if user.role == Role::Manager {
            self.teams_managed_by(user.id)?
        } else {
            Vec::new()
        };
        Ok(Caller {
            user_id: user.id,
            name: user.name,
            role: user.role,
            team_id: user.team_id,
            managed_teams,
            impersonated_by: None,
        })
    }
}
