//! Lead records and field validation.

use crate::{
    error::{DeskError, DeskResult},
    status::{LeadStatus, TransferStatus},
    types::{LeadId, RefId, TeamId, UserId},
    visibility::LeadOwner,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Everything an agent fills in on the intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadDetails {
    pub center_code_id:     RefId,
    pub insurance_id:       RefId,
    pub product_id:         RefId,
    #[serde(default)]
    pub transfer_status:    TransferStatus,
    pub patient_phone:      String,
    #[serde(default)]
    pub secondary_phone:    Option<String>,
    pub first_name:         String,
    pub last_name:          String,
    pub dob:                NaiveDate,
    pub medicare_id:        String,
    pub address:            String,
    pub city:               String,
    pub state:              String,
    pub zip:                String,
    pub product_specs:      String,
    pub doctor_name:        String,
    pub facility_name:      String,
    pub patient_last_visit: String,
    #[serde(default)]
    pub doctor_address:     Option<String>,
    pub doctor_phone:       String,
    pub doctor_fax:         String,
    pub doctor_npi:         String,
    pub recording_link:     String,
    pub comments:           String,
}

/// (field, max length). `None` means required but unbounded.
const REQUIRED_FIELDS: &[(&str, Option<usize>)] = &[
    ("patient_phone", Some(15)),
    ("first_name", Some(15)),
    ("last_name", Some(15)),
    ("medicare_id", Some(15)),
    ("address", None),
    ("city", Some(15)),
    ("state", Some(15)),
    ("zip", Some(15)),
    ("product_specs", None),
    ("doctor_name", Some(30)),
    ("facility_name", Some(20)),
    ("patient_last_visit", Some(20)),
    ("doctor_phone", Some(15)),
    ("doctor_fax", Some(20)),
    ("doctor_npi", Some(50)),
    ("recording_link", None),
    ("comments", None),
];

const SECONDARY_PHONE_MAX: usize = 15;

/// Reference names (insurance, product, center code) share one limit.
pub const REFERENCE_NAME_MAX: usize = 50;

impl LeadDetails {
    fn field(&self, name: &str) -> &str {
        match name {
            "patient_phone"      => &self.patient_phone,
            "first_name"         => &self.first_name,
            "last_name"          => &self.last_name,
            "medicare_id"        => &self.medicare_id,
            "address"            => &self.address,
            "city"               => &self.city,
            "state"              => &self.state,
            "zip"                => &self.zip,
            "product_specs"      => &self.product_specs,
            "doctor_name"        => &self.doctor_name,
            "facility_name"      => &self.facility_name,
            "patient_last_visit" => &self.patient_last_visit,
            "doctor_phone"       => &self.doctor_phone,
            "doctor_fax"         => &self.doctor_fax,
            "doctor_npi"         => &self.doctor_npi,
            "recording_link"     => &self.recording_link,
            "comments"           => &self.comments,
            _ => "",
        }
    }

    /// Field-level checks that need no database. Uniqueness is checked by the store.
    pub fn validate(&self) -> DeskResult<()> {
        for (name, max) in REQUIRED_FIELDS {
            let value = self.field(name).trim();
            if value.is_empty() {
                return Err(DeskError::validation(*name, "is required"));
            }
            if let Some(max) = max {
                if value.chars().count() > *max {
                    return Err(DeskError::validation(
                        *name,
                        format!("must be at most {max} characters"),
                    ));
                }
            }
        }
        if let Some(phone) = &self.secondary_phone {
            if phone.chars().count() > SECONDARY_PHONE_MAX {
                return Err(DeskError::validation(
                    "secondary_phone",
                    format!("must be at most {SECONDARY_PHONE_MAX} characters"),
                ));
            }
        }
        Ok(())
    }
}

pub fn validate_reference_name(name: &str) -> DeskResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DeskError::validation("name", "is required"));
    }
    if trimmed.chars().count() > REFERENCE_NAME_MAX {
        return Err(DeskError::validation(
            "name",
            format!("must be at most {REFERENCE_NAME_MAX} characters"),
        ));
    }
    Ok(())
}

/// A lead as stored, joined with its owner and reference names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id:             LeadId,
    pub user_id:        UserId,
    pub agent_name:     String,
    pub team_id:        Option<TeamId>,
    /// Derived from the owner's team; never written on the lead itself.
    pub team:           Option<String>,
    pub status:         LeadStatus,
    pub insurance_name: String,
    pub product_name:   String,
    pub center_code:    String,
    pub details:        LeadDetails,
    pub created_at:     DateTime<Utc>,
    pub updated_at:     DateTime<Utc>,
}

impl LeadRecord {
    pub fn owner(&self) -> LeadOwner {
        LeadOwner {
            user_id:   self.user_id,
            team_id:   self.team_id,
            team_name: self.team.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A form that passes validation. `n` keeps phone and medicare id unique.
    pub fn details(n: u32, insurance_id: RefId, product_id: RefId, center_code_id: RefId) -> LeadDetails {
        LeadDetails {
            center_code_id,
            insurance_id,
            product_id,
            transfer_status: TransferStatus::Awaiting,
            patient_phone: format!("555{n:07}"),
            secondary_phone: None,
            first_name: "Mary".into(),
            last_name: "Jones".into(),
            dob: NaiveDate::from_ymd_opt(1948, 3, 14).unwrap(),
            medicare_id: format!("MC{n:08}"),
            address: "12 Elm St".into(),
            city: "Dayton".into(),
            state: "OH".into(),
            zip: "45402".into(),
            product_specs: "Knee brace, left".into(),
            doctor_name: "Dr. Patel".into(),
            facility_name: "Dayton Clinic".into(),
            patient_last_visit: "2026-08-01".into(),
            doctor_address: None,
            doctor_phone: "5550001111".into(),
            doctor_fax: "5550002222".into(),
            doctor_npi: "1234567890".into(),
            recording_link: "https://rec.example/1".into(),
            comments: "Interested".into(),
        }
    }
}
