//! Shared fixture: a small office with two teams and leads spread across
//! every kind of owner.

#![allow(dead_code)]

use chrono::NaiveDate;
use lead_desk_core::{
    desk::LeadDesk,
    identity::{Caller, NewUser},
    lead::LeadDetails,
    role::Role,
    status::TransferStatus,
    store::{RefEntity, Stamp},
    types::{LeadId, RefId, TeamId, UserId},
};

pub struct Refs {
    pub insurance:   RefId,
    pub product:     RefId,
    pub center_code: RefId,
}

pub struct Office {
    pub desk:        LeadDesk,
    pub admin:       Caller,
    pub hr:          Caller,
    pub qa:          Caller,
    /// Manager of team "northteam".
    pub north:       Caller,
    /// Manager of team "south".
    pub south:       Caller,
    pub north_a:     Caller,
    pub north_b:     Caller,
    pub south_a:     Caller,
    /// Agent with no team.
    pub loner:       Caller,
    pub refs:        Refs,
    pub north_team:  TeamId,
    pub south_team:  TeamId,
    /// (owner, lead) for every fixture lead.
    pub leads:       Vec<(UserId, LeadId)>,
}

/// A form that passes validation; `n` keeps the unique columns unique.
pub fn details(n: u32, refs: &Refs) -> LeadDetails {
    LeadDetails {
        center_code_id: refs.center_code,
        insurance_id: refs.insurance,
        product_id: refs.product,
        transfer_status: TransferStatus::Transferred,
        patient_phone: format!("555{n:07}"),
        secondary_phone: None,
        first_name: "Walter".into(),
        last_name: "Hill".into(),
        dob: NaiveDate::from_ymd_opt(1950, 6, 2).unwrap(),
        medicare_id: format!("MC{n:08}"),
        address: "40 Oak St".into(),
        city: "Tulsa".into(),
        state: "OK".into(),
        zip: "74103".into(),
        product_specs: "Back brace, medium".into(),
        doctor_name: "Dr. Young".into(),
        facility_name: "Summit Clinic".into(),
        patient_last_visit: "2 months ago".into(),
        doctor_address: None,
        doctor_phone: "5553334444".into(),
        doctor_fax: "5553335555".into(),
        doctor_npi: "9876543210".into(),
        recording_link: "https://rec.example/7".into(),
        comments: "Call back Tuesday".into(),
    }
}

fn add_user(desk: &LeadDesk, name: &str, role: Role, team_id: Option<TeamId>) -> UserId {
    desk.store
        .insert_user(
            &NewUser {
                name: name.into(),
                email: format!("{}@office.test", name.to_lowercase()),
                role,
                team_id,
            },
            Stamp { actor: 0, at: desk.clock.now() },
        )
        .unwrap()
}

pub fn office() -> Office {
    let _ = env_logger::builder().is_test(true).try_init();
    let desk = LeadDesk::build_test().unwrap();
    let admin_id = add_user(&desk, "Root", Role::Admin, None);
    let admin = desk.caller(admin_id).unwrap();

    let north_id = add_user(&desk, "NorthTeam", Role::Manager, None);
    let south_id = add_user(&desk, "South", Role::Manager, None);
    let north_team = desk.create_team(&admin, north_id, None).unwrap();
    let south_team = desk.create_team(&admin, south_id, None).unwrap();

    let hr = add_user(&desk, "Hana", Role::Hr, None);
    let qa = add_user(&desk, "Quinn", Role::Qa, None);
    let north_a = add_user(&desk, "Ali", Role::Agent, Some(north_team));
    let north_b = add_user(&desk, "Bea", Role::Agent, Some(north_team));
    let south_a = add_user(&desk, "Sam", Role::Agent, Some(south_team));
    let loner = add_user(&desk, "Lou", Role::Agent, None);

    let refs = Refs {
        insurance: desk.create_reference(&admin, RefEntity::Insurance, "Humana").unwrap(),
        product: desk.create_reference(&admin, RefEntity::Product, "Back Brace").unwrap(),
        center_code: desk.create_reference(&admin, RefEntity::CenterCode, "C-200").unwrap(),
    };

    let mut leads = Vec::new();
    let mut n = 0;
    for (owner, count) in [(north_a, 2), (north_b, 1), (south_a, 2), (loner, 1)] {
        let caller = desk.caller(owner).unwrap();
        for _ in 0..count {
            n += 1;
            leads.push((owner, desk.create_lead(&caller, &details(n, &refs)).unwrap()));
        }
    }
    // Managers cannot create leads through the desk, but older data has
    // leads owned by managers.
    n += 1;
    let stamp = Stamp { actor: 0, at: desk.clock.now() };
    leads.push((north_id, desk.store.insert_lead(north_id, &details(n, &refs), stamp).unwrap()));

    Office {
        hr: desk.caller(hr).unwrap(),
        qa: desk.caller(qa).unwrap(),
        north: desk.caller(north_id).unwrap(),
        south: desk.caller(south_id).unwrap(),
        north_a: desk.caller(north_a).unwrap(),
        north_b: desk.caller(north_b).unwrap(),
        south_a: desk.caller(south_a).unwrap(),
        loner: desk.caller(loner).unwrap(),
        desk,
        admin,
        refs,
        north_team,
        south_team,
        leads,
    }
}

impl Office {
    pub fn leads_of(&self, owners: &[UserId]) -> Vec<LeadId> {
        let mut ids: Vec<LeadId> = self
            .leads
            .iter()
            .filter(|(owner, _)| owners.contains(owner))
            .map(|(_, id)| *id)
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids
    }

    pub fn all_leads(&self) -> Vec<LeadId> {
        let mut ids: Vec<LeadId> = self.leads.iter().map(|(_, id)| *id).collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids
    }
}
