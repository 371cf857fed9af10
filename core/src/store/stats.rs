//! Aggregate queries behind the dashboards and the commission table.

use super::{lead::LEAD_FROM, parse_date, parse_enum, ts, DeskStore};
use crate::{
    commission::StatusCounts,
    error::DeskResult,
    role::Role,
    status::LeadStatus,
    types::UserId,
    visibility::SqlPredicate,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params_from_iter, types::Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub day:   NaiveDate,
    pub count: i64,
}

/// One row of the admin commission table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLeadCounts {
    pub user_id:  UserId,
    pub name:     String,
    pub email:    String,
    pub role:     Role,
    pub total:    i64,
    pub billed:   i64,
    pub paid:     i64,
    pub returned: i64,
}

impl DeskStore {
    /// Lead counts per status over the rows matching `filter`.
    pub fn status_counts(&self, filter: &SqlPredicate) -> DeskResult<StatusCounts> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT l.status, COUNT(*) {LEAD_FROM} WHERE ({}) GROUP BY l.status",
            filter.clause
        ))?;
        let rows = stmt.query_map(params_from_iter(filter.values.iter()), |row| {
            Ok((parse_enum::<LeadStatus>(0, row.get(0)?)?, row.get::<_, i64>(1)?))
        })?;
        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, n) = row?;
            counts.add(status, n);
        }
        Ok(counts)
    }

    /// Leads created per day since `since`, oldest day first. Days with no
    /// leads are absent.
    pub fn daily_lead_counts(
        &self,
        filter: &SqlPredicate,
        since: DateTime<Utc>,
    ) -> DeskResult<Vec<DailyCount>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT substr(l.created_at, 1, 10) AS day, COUNT(*)
             {LEAD_FROM}
             WHERE ({}) AND l.created_at >= ?
             GROUP BY day ORDER BY day ASC",
            filter.clause
        ))?;
        let mut values = filter.values.clone();
        values.push(Value::Text(ts(&since)));
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(DailyCount {
                day:   parse_date(0, row.get(0)?)?,
                count: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Per-user lead counts for every non-admin user, by name.
    pub fn user_lead_counts(&self) -> DeskResult<Vec<UserLeadCounts>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.name, u.email, u.role,
                    COUNT(l.id),
                    COALESCE(SUM(CASE WHEN l.status = 'billable' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN l.status = 'paid'     THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN l.status = 'returned' THEN 1 ELSE 0 END), 0)
             FROM app_user u
             LEFT JOIN lead l ON l.user_id = u.id
             WHERE u.role != 'admin'
             GROUP BY u.id
             ORDER BY u.name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(UserLeadCounts {
                user_id:  row.get(0)?,
                name:     row.get(1)?,
                email:    row.get(2)?,
                role:     parse_enum(3, row.get(3)?)?,
                total:    row.get(4)?,
                billed:   row.get(5)?,
                paid:     row.get(6)?,
                returned: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
