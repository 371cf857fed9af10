//! Reference tables: insurance providers, products, center codes.

use super::{parse_ts, placeholders, ts, unique_violation, DeskStore, Stamp};
use crate::{
    error::{DeskError, DeskResult},
    event::DeskEvent,
    types::RefId,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefEntity {
    Insurance,
    Product,
    CenterCode,
}

impl RefEntity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Insurance  => "insurance",
            Self::Product    => "product",
            Self::CenterCode => "center_code",
        }
    }

    fn table(&self) -> &'static str {
        // Table names double as entity names.
        self.name()
    }

    /// Foreign-key column on `lead`.
    fn lead_column(&self) -> &'static str {
        match self {
            Self::Insurance  => "insurance_id",
            Self::Product    => "product_id",
            Self::CenterCode => "center_code_id",
        }
    }
}

impl fmt::Display for RefEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub id:         RefId,
    pub name:       String,
    /// Leads currently pointing at this row.
    pub lead_count: i64,
    pub created_at: DateTime<Utc>,
}

impl DeskStore {
    pub fn insert_reference(&self, entity: RefEntity, name: &str, stamp: Stamp) -> DeskResult<RefId> {
        let tx = self.conn.unchecked_transaction()?;
        let name = name.trim();
        self.conn
            .execute(
                &format!("INSERT INTO {} (name, created_at) VALUES (?1, ?2)", entity.table()),
                params![name, ts(&stamp.at)],
            )
            .map_err(|e| unique_violation(e, "name", &format!("this {entity} already exists")))?;
        let id = self.conn.last_insert_rowid();
        self.record(
            stamp,
            &DeskEvent::ReferenceCreated {
                entity: entity.name().to_string(),
                id,
                name: name.to_string(),
            },
            None,
        )?;
        tx.commit()?;
        Ok(id)
    }

    pub fn rename_reference(
        &self,
        entity: RefEntity,
        id: RefId,
        name: &str,
        stamp: Stamp,
    ) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let name = name.trim();
        let changed = self
            .conn
            .execute(
                &format!("UPDATE {} SET name = ?1 WHERE id = ?2", entity.table()),
                params![name, id],
            )
            .map_err(|e| unique_violation(e, "name", &format!("this {entity} already exists")))?;
        if changed == 0 {
            return Err(DeskError::NotFound { entity: entity.name(), id });
        }
        self.record(
            stamp,
            &DeskEvent::ReferenceRenamed {
                entity: entity.name().to_string(),
                id,
                name: name.to_string(),
            },
            None,
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_reference(&self, entity: RefEntity, id: RefId) -> DeskResult<Option<ReferenceRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT r.id, r.name, r.created_at,
                            (SELECT COUNT(*) FROM lead l WHERE l.{col} = r.id)
                     FROM {table} r WHERE r.id = ?1",
                    col = entity.lead_column(),
                    table = entity.table(),
                ),
                params![id],
                reference_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All rows with their lead counts, by name.
    pub fn list_references(&self, entity: RefEntity) -> DeskResult<Vec<ReferenceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT r.id, r.name, r.created_at, COUNT(l.id)
             FROM {table} r LEFT JOIN lead l ON l.{col} = r.id
             GROUP BY r.id
             ORDER BY r.name ASC",
            col = entity.lead_column(),
            table = entity.table(),
        ))?;
        let rows = stmt.query_map([], reference_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete every id or none. Fails with ReferentialIntegrity on the first
    /// row that any lead still references. Repeated ids count once.
    pub fn delete_references(
        &self,
        entity: RefEntity,
        ids: &[RefId],
        stamp: Stamp,
    ) -> DeskResult<usize> {
        let mut seen = HashSet::new();
        let ids: Vec<RefId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.unchecked_transaction()?;
        for &id in &ids {
            let record = self
                .get_reference(entity, id)?
                .ok_or(DeskError::NotFound { entity: entity.name(), id })?;
            if record.lead_count > 0 {
                return Err(DeskError::ReferentialIntegrity {
                    entity: entity.name(),
                    id,
                    lead_count: record.lead_count,
                });
            }
        }
        let deleted = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE id IN ({})",
                entity.table(),
                placeholders(ids.len())
            ),
            params_from_iter(ids.iter()),
        )?;
        self.record(
            stamp,
            &DeskEvent::ReferenceDeleted {
                entity: entity.name().to_string(),
                ids,
            },
            None,
        )?;
        tx.commit()?;
        Ok(deleted)
    }
}

fn reference_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferenceRecord> {
    Ok(ReferenceRecord {
        id:         row.get(0)?,
        name:       row.get(1)?,
        created_at: parse_ts(2, row.get(2)?)?,
        lead_count: row.get(3)?,
    })
}
