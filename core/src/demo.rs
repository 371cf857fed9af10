//! Deterministic demo data for an empty desk.
//!
//! Builds a small office (admin, hr, qa, managers with their teams,
//! agents), the reference tables, and a spread of leads across every
//! status over the trend window. Same seed, same office.

use crate::{
    desk::LeadDesk,
    error::DeskResult,
    identity::{NewUser, TeamRecord},
    lead::LeadDetails,
    name_generator::NameGenerator,
    rng::{DemoRng, DemoStream},
    role::Role,
    status::{LeadStatus, TransferStatus},
    store::{RefEntity, Stamp},
    types::{RefId, TeamId, UserId},
};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

const INSURANCES: &[&str] = &["Medicare Part B", "Humana", "Aetna", "Cigna", "Wellcare"];
const PRODUCTS: &[&str] = &["Knee Brace", "Back Brace", "Wrist Brace", "Shoulder Brace", "CGM"];
const CENTER_CODES: &[&str] = &["C-101", "C-102", "C-103"];

/// Final status mix, and the legal path that reaches each from `new`.
const STATUS_MIX: &[(u32, &[LeadStatus])] = &[
    (40, &[]),
    (20, &[LeadStatus::Billable]),
    (15, &[LeadStatus::Billable, LeadStatus::Paid]),
    (10, &[LeadStatus::Returned]),
    (10, &[LeadStatus::BadLead]),
    (5, &[LeadStatus::Returned, LeadStatus::DeductedReturn]),
];

#[derive(Debug, Clone, Copy)]
pub struct DemoPlan {
    pub managers:        usize,
    pub agents_per_team: usize,
    pub leads:           usize,
}

impl Default for DemoPlan {
    fn default() -> Self {
        Self {
            managers:        2,
            agents_per_team: 3,
            leads:           60,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoSummary {
    pub admin_id: UserId,
    pub users:    usize,
    pub teams:    usize,
    pub leads:    usize,
}

struct Roster {
    admin_id: UserId,
    agents:   Vec<UserId>,
    users:    usize,
    teams:    usize,
}

struct References {
    insurance:   Vec<RefId>,
    product:     Vec<RefId>,
    center_code: Vec<RefId>,
}

/// Populate the desk. Expects an empty store: handles and phone numbers
/// are only unique within one run.
pub fn seed_demo(desk: &LeadDesk, seed: u64, plan: DemoPlan) -> DeskResult<DemoSummary> {
    let now = desk.clock.now();
    let system = Stamp { actor: 0, at: now };

    let roster = seed_roster(desk, &mut DemoRng::new(seed, DemoStream::Roster), plan, system)?;
    let refs = seed_references(desk, system)?;

    let mut rng = DemoRng::new(seed, DemoStream::Leads);
    let window = desk.config.settings.trend_window_days.max(1) as u64;
    let weights: Vec<u32> = STATUS_MIX.iter().map(|(w, _)| *w).collect();
    let mut leads = 0;
    for n in 0..plan.leads {
        let Some(&agent) = rng.pick(&roster.agents) else {
            break;
        };
        let at = now
            - Duration::days(rng.below(window) as i64)
            - Duration::seconds(rng.below(86_400) as i64);
        let details = demo_details(&mut rng, n, &refs)?;
        let lead_id = desk
            .store
            .insert_lead(agent, &details, Stamp { actor: agent, at })?;

        let path = STATUS_MIX[rng.weighted(&weights)].1;
        let mut from = LeadStatus::New;
        for &to in path {
            desk.store.set_lead_status(
                lead_id,
                from,
                to,
                Stamp { actor: roster.admin_id, at },
            )?;
            from = to;
        }
        leads += 1;
    }

    log::info!(
        "demo: seeded {} users, {} teams, {leads} leads from seed {seed}",
        roster.users,
        roster.teams
    );
    Ok(DemoSummary {
        admin_id: roster.admin_id,
        users: roster.users,
        teams: roster.teams,
        leads,
    })
}

fn seed_roster(desk: &LeadDesk, rng: &mut DemoRng, plan: DemoPlan, stamp: Stamp) -> DeskResult<Roster> {
    let mut used = HashSet::new();
    let mut handle = |rng: &mut DemoRng| {
        let base = NameGenerator::staff_handle(rng);
        let mut name = base.clone();
        let mut n = 2;
        while !used.insert(name.clone()) {
            name = format!("{base}{n}");
            n += 1;
        }
        name
    };
    let add = |name: &str, role: Role, team_id: Option<TeamId>| {
        desk.store.insert_user(
            &NewUser {
                name: name.to_string(),
                email: format!("{name}@desk.local"),
                role,
                team_id,
            },
            stamp,
        )
    };

    let admin_id = add("admin", Role::Admin, None)?;
    add("hr", Role::Hr, None)?;
    add("qa", Role::Qa, None)?;
    let mut users = 3;
    let mut teams = 0;
    let mut agents = Vec::new();

    for _ in 0..plan.managers {
        let manager = handle(rng);
        let manager_id = add(&manager, Role::Manager, None)?;
        let team_id = desk
            .store
            .insert_team(&TeamRecord::conventional_name(&manager), manager_id, stamp)?;
        users += 1;
        teams += 1;
        for _ in 0..plan.agents_per_team {
            let agent = handle(rng);
            agents.push(add(&agent, Role::Agent, Some(team_id))?);
            users += 1;
        }
    }
    Ok(Roster { admin_id, agents, users, teams })
}

fn seed_references(desk: &LeadDesk, stamp: Stamp) -> DeskResult<References> {
    let insert = |entity, names: &[&str]| -> DeskResult<Vec<RefId>> {
        names
            .iter()
            .map(|name| desk.store.insert_reference(entity, name, stamp))
            .collect()
    };
    Ok(References {
        insurance:   insert(RefEntity::Insurance, INSURANCES)?,
        product:     insert(RefEntity::Product, PRODUCTS)?,
        center_code: insert(RefEntity::CenterCode, CENTER_CODES)?,
    })
}

fn demo_details(rng: &mut DemoRng, n: usize, refs: &References) -> DeskResult<LeadDetails> {
    let (city, state, zip_prefix) = NameGenerator::place(rng);
    let dob = NaiveDate::from_ymd_opt(
        1935 + rng.below(30) as i32,
        1 + rng.below(12) as u32,
        1 + rng.below(28) as u32,
    )
    .ok_or_else(|| anyhow::anyhow!("demo date of birth out of range"))?;
    let transfer_status = match rng.below(3) {
        0 => TransferStatus::Transferred,
        1 => TransferStatus::NotTransferred,
        _ => TransferStatus::Awaiting,
    };
    let pick = |rng: &mut DemoRng, ids: &[RefId]| rng.pick(ids).copied().unwrap_or_default();

    Ok(LeadDetails {
        center_code_id: pick(rng, &refs.center_code),
        insurance_id: pick(rng, &refs.insurance),
        product_id: pick(rng, &refs.product),
        transfer_status,
        // The counter suffix keeps both unique columns unique.
        patient_phone: format!("{}{n:06}", rng.digits(4)),
        secondary_phone: rng.chance(0.3).then(|| rng.digits(10)),
        first_name: NameGenerator::first_name(rng).to_string(),
        last_name: NameGenerator::last_name(rng).to_string(),
        dob,
        medicare_id: format!("{}M{n:06}", rng.digits(3)),
        address: NameGenerator::street_address(rng),
        city: city.to_string(),
        state: state.to_string(),
        zip: format!("{zip_prefix}{}", rng.digits(2)),
        product_specs: "Standard fit".to_string(),
        doctor_name: NameGenerator::doctor_name(rng),
        facility_name: NameGenerator::facility_name(rng),
        patient_last_visit: format!("{} months ago", 1 + rng.below(11)),
        doctor_address: rng.chance(0.5).then(|| NameGenerator::street_address(rng)),
        doctor_phone: rng.digits(10),
        doctor_fax: rng.digits(10),
        doctor_npi: rng.digits(10),
        recording_link: format!("https://recordings.desk.local/{n:06}"),
        comments: "Demo lead".to_string(),
    })
}
