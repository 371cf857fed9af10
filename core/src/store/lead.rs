use super::{date, parse_date, parse_enum, parse_ts, placeholders, ts, unique_violation, DeskStore, RefEntity, Stamp};
use crate::{
    error::{DeskError, DeskResult},
    event::DeskEvent,
    lead::{LeadDetails, LeadRecord},
    status::LeadStatus,
    types::{LeadId, UserId},
    visibility::SqlPredicate,
};
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension};

/// Every lead query selects these columns in this order; see `lead_row_mapper`.
const LEAD_SELECT: &str = "SELECT
        l.id, l.user_id, u.name, u.team_id, t.name, l.status,
        i.name, p.name, c.name,
        l.center_code_id, l.insurance_id, l.product_id, l.transfer_status,
        l.patient_phone, l.secondary_phone, l.first_name, l.last_name, l.dob,
        l.medicare_id, l.address, l.city, l.state, l.zip, l.product_specs,
        l.doctor_name, l.facility_name, l.patient_last_visit, l.doctor_address,
        l.doctor_phone, l.doctor_fax, l.doctor_npi, l.recording_link, l.comments,
        l.created_at, l.updated_at";

/// Joins shared by every lead query. Owner is `u`, lead is `l`.
pub(crate) const LEAD_FROM: &str = "FROM lead l
     JOIN app_user u ON u.id = l.user_id
     LEFT JOIN team t ON t.id = u.team_id
     JOIN insurance i ON i.id = l.insurance_id
     JOIN product p ON p.id = l.product_id
     JOIN center_code c ON c.id = l.center_code_id";

fn lead_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<LeadRecord> {
    Ok(LeadRecord {
        id:             row.get(0)?,
        user_id:        row.get(1)?,
        agent_name:     row.get(2)?,
        team_id:        row.get(3)?,
        team:           row.get(4)?,
        status:         parse_enum(5, row.get(5)?)?,
        insurance_name: row.get(6)?,
        product_name:   row.get(7)?,
        center_code:    row.get(8)?,
        details: LeadDetails {
            center_code_id:     row.get(9)?,
            insurance_id:       row.get(10)?,
            product_id:         row.get(11)?,
            transfer_status:    parse_enum(12, row.get(12)?)?,
            patient_phone:      row.get(13)?,
            secondary_phone:    row.get(14)?,
            first_name:         row.get(15)?,
            last_name:          row.get(16)?,
            dob:                parse_date(17, row.get(17)?)?,
            medicare_id:        row.get(18)?,
            address:            row.get(19)?,
            city:               row.get(20)?,
            state:              row.get(21)?,
            zip:                row.get(22)?,
            product_specs:      row.get(23)?,
            doctor_name:        row.get(24)?,
            facility_name:      row.get(25)?,
            patient_last_visit: row.get(26)?,
            doctor_address:     row.get(27)?,
            doctor_phone:       row.get(28)?,
            doctor_fax:         row.get(29)?,
            doctor_npi:         row.get(30)?,
            recording_link:     row.get(31)?,
            comments:           row.get(32)?,
        },
        created_at:     parse_ts(33, row.get(33)?)?,
        updated_at:     parse_ts(34, row.get(34)?)?,
    })
}

impl DeskStore {
    // ── Lead writes ────────────────────────────────────────────────

    /// Insert a new lead owned by `owner` in status `new`.
    pub fn insert_lead(&self, owner: UserId, details: &LeadDetails, stamp: Stamp) -> DeskResult<LeadId> {
        let tx = self.conn.unchecked_transaction()?;
        self.check_lead_unique(details, None)?;
        self.check_lead_references(details)?;
        let now = ts(&stamp.at);
        self.conn
            .execute(
                "INSERT INTO lead (
                    user_id, status, transfer_status, center_code_id, insurance_id, product_id,
                    patient_phone, secondary_phone, first_name, last_name, dob, medicare_id,
                    address, city, state, zip, product_specs, doctor_name, facility_name,
                    patient_last_visit, doctor_address, doctor_phone, doctor_fax, doctor_npi,
                    recording_link, comments, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                           ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?27)",
                params![
                    owner,
                    LeadStatus::New.as_str(),
                    details.transfer_status.as_str(),
                    details.center_code_id,
                    details.insurance_id,
                    details.product_id,
                    details.patient_phone.trim(),
                    details.secondary_phone.as_deref(),
                    details.first_name.trim(),
                    details.last_name.trim(),
                    date(&details.dob),
                    details.medicare_id.trim(),
                    details.address.trim(),
                    details.city.trim(),
                    details.state.trim(),
                    details.zip.trim(),
                    details.product_specs.trim(),
                    details.doctor_name.trim(),
                    details.facility_name.trim(),
                    details.patient_last_visit.trim(),
                    details.doctor_address.as_deref(),
                    details.doctor_phone.trim(),
                    details.doctor_fax.trim(),
                    details.doctor_npi.trim(),
                    details.recording_link.trim(),
                    details.comments.trim(),
                    now,
                ],
            )
            .map_err(|e| unique_violation(e, "patient_phone", "has already been taken"))?;
        let lead_id = self.conn.last_insert_rowid();
        self.record(stamp, &DeskEvent::LeadCreated { lead_id, user_id: owner }, None)?;
        tx.commit()?;
        Ok(lead_id)
    }

    pub fn update_lead_details(
        &self,
        lead_id: LeadId,
        details: &LeadDetails,
        stamp: Stamp,
    ) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.check_lead_unique(details, Some(lead_id))?;
        self.check_lead_references(details)?;
        let changed = self
            .conn
            .execute(
                "UPDATE lead SET
                    transfer_status = ?1, center_code_id = ?2, insurance_id = ?3, product_id = ?4,
                    patient_phone = ?5, secondary_phone = ?6, first_name = ?7, last_name = ?8,
                    dob = ?9, medicare_id = ?10, address = ?11, city = ?12, state = ?13,
                    zip = ?14, product_specs = ?15, doctor_name = ?16, facility_name = ?17,
                    patient_last_visit = ?18, doctor_address = ?19, doctor_phone = ?20,
                    doctor_fax = ?21, doctor_npi = ?22, recording_link = ?23, comments = ?24,
                    updated_at = ?25
                 WHERE id = ?26",
                params![
                    details.transfer_status.as_str(),
                    details.center_code_id,
                    details.insurance_id,
                    details.product_id,
                    details.patient_phone.trim(),
                    details.secondary_phone.as_deref(),
                    details.first_name.trim(),
                    details.last_name.trim(),
                    date(&details.dob),
                    details.medicare_id.trim(),
                    details.address.trim(),
                    details.city.trim(),
                    details.state.trim(),
                    details.zip.trim(),
                    details.product_specs.trim(),
                    details.doctor_name.trim(),
                    details.facility_name.trim(),
                    details.patient_last_visit.trim(),
                    details.doctor_address.as_deref(),
                    details.doctor_phone.trim(),
                    details.doctor_fax.trim(),
                    details.doctor_npi.trim(),
                    details.recording_link.trim(),
                    details.comments.trim(),
                    ts(&stamp.at),
                    lead_id,
                ],
            )
            .map_err(|e| unique_violation(e, "patient_phone", "has already been taken"))?;
        if changed == 0 {
            return Err(DeskError::NotFound { entity: "lead", id: lead_id });
        }
        self.record(stamp, &DeskEvent::LeadDetailsUpdated { lead_id }, None)?;
        tx.commit()?;
        Ok(())
    }

    pub fn set_lead_status(
        &self,
        lead_id: LeadId,
        from: LeadStatus,
        to: LeadStatus,
        stamp: Stamp,
    ) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = self.conn.execute(
            "UPDATE lead SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![to.as_str(), ts(&stamp.at), lead_id],
        )?;
        if changed == 0 {
            return Err(DeskError::NotFound { entity: "lead", id: lead_id });
        }
        self.record(stamp, &DeskEvent::LeadStatusChanged { lead_id, from, to }, None)?;
        tx.commit()?;
        Ok(())
    }

    /// Set `status` on every id in one transaction, `chunk_size` ids per statement.
    /// Callers check policy first; this only guarantees all-or-nothing.
    pub fn bulk_set_status(
        &self,
        lead_ids: &[LeadId],
        status: LeadStatus,
        chunk_size: usize,
        stamp: Stamp,
        batch_id: &str,
    ) -> DeskResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let now = ts(&stamp.at);
        let mut updated = 0;
        for chunk in lead_ids.chunks(chunk_size.max(1)) {
            let mut values: Vec<Value> = vec![Value::Text(status.as_str().into()), Value::Text(now.clone())];
            values.extend(chunk.iter().map(|id| Value::Integer(*id)));
            updated += self.conn.execute(
                &format!(
                    "UPDATE lead SET status = ?, updated_at = ? WHERE id IN ({})",
                    placeholders(chunk.len())
                ),
                params_from_iter(values.iter()),
            )?;
        }
        if updated != lead_ids.len() {
            return Err(DeskError::validation(
                "lead_ids",
                format!("expected {} rows, updated {updated}", lead_ids.len()),
            ));
        }
        self.record(
            stamp,
            &DeskEvent::LeadsStatusBulkUpdated {
                status,
                lead_ids: lead_ids.to_vec(),
            },
            Some(batch_id),
        )?;
        tx.commit()?;
        Ok(updated)
    }

    /// Delete every id in one transaction, `chunk_size` ids per statement.
    pub fn delete_leads(
        &self,
        lead_ids: &[LeadId],
        chunk_size: usize,
        stamp: Stamp,
        batch_id: Option<&str>,
    ) -> DeskResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut deleted = 0;
        for chunk in lead_ids.chunks(chunk_size.max(1)) {
            deleted += self.conn.execute(
                &format!("DELETE FROM lead WHERE id IN ({})", placeholders(chunk.len())),
                params_from_iter(chunk.iter()),
            )?;
        }
        if deleted != lead_ids.len() {
            return Err(DeskError::validation(
                "lead_ids",
                format!("expected {} rows, deleted {deleted}", lead_ids.len()),
            ));
        }
        self.record(
            stamp,
            &DeskEvent::LeadsDeleted {
                lead_ids: lead_ids.to_vec(),
            },
            batch_id,
        )?;
        tx.commit()?;
        Ok(deleted)
    }

    // ── Lead reads ─────────────────────────────────────────────────

    pub fn get_lead(&self, lead_id: LeadId) -> DeskResult<Option<LeadRecord>> {
        self.conn
            .query_row(
                &format!("{LEAD_SELECT} {LEAD_FROM} WHERE l.id = ?1"),
                params![lead_id],
                lead_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Leads matching `filter`, newest id first.
    pub fn query_leads(&self, filter: &SqlPredicate) -> DeskResult<Vec<LeadRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LEAD_SELECT} {LEAD_FROM} WHERE ({}) ORDER BY l.id DESC",
            filter.clause
        ))?;
        let rows = stmt.query_map(params_from_iter(filter.values.iter()), lead_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count_leads(&self, filter: &SqlPredicate) -> DeskResult<i64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) {LEAD_FROM} WHERE ({})", filter.clause),
            params_from_iter(filter.values.iter()),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Integrity checks ───────────────────────────────────────────

    fn check_lead_unique(&self, details: &LeadDetails, exclude: Option<LeadId>) -> DeskResult<()> {
        let exclude = exclude.unwrap_or(-1);
        for (field, value) in [
            ("patient_phone", details.patient_phone.trim()),
            ("medicare_id", details.medicare_id.trim()),
        ] {
            let taken: bool = self.conn.query_row(
                &format!("SELECT EXISTS (SELECT 1 FROM lead WHERE {field} = ?1 AND id != ?2)"),
                params![value, exclude],
                |row| row.get(0),
            )?;
            if taken {
                return Err(DeskError::validation(field, "has already been taken"));
            }
        }
        Ok(())
    }

    fn check_lead_references(&self, details: &LeadDetails) -> DeskResult<()> {
        for (entity, id) in [
            (RefEntity::Insurance, details.insurance_id),
            (RefEntity::Product, details.product_id),
            (RefEntity::CenterCode, details.center_code_id),
        ] {
            if self.get_reference(entity, id)?.is_none() {
                return Err(DeskError::NotFound { entity: entity.name(), id });
            }
        }
        Ok(())
    }
}
