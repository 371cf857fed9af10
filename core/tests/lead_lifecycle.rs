//! Lead writes: status moves, bulk batches, imports, deletes and
//! reference protection.

mod common;

use common::{details, office};
use lead_desk_core::{
    error::DeskError,
    status::LeadStatus,
    store::RefEntity,
    view::{ViewKind, ViewQuery},
};

#[test]
fn bulk_status_update_sets_every_lead() {
    let o = office();
    let ids = o.all_leads();
    let out = o
        .desk
        .bulk_update_status(&o.admin, &ids, LeadStatus::Billable)
        .unwrap();
    assert_eq!(out.affected, ids.len());
    assert_eq!(
        out.notice.body,
        format!("Status updated successfully for {} records.", ids.len())
    );
    for id in ids {
        assert_eq!(o.desk.get_lead(&o.admin, id).unwrap().status, LeadStatus::Billable);
    }
    let events = o.desk.store.recent_events(1).unwrap();
    assert_eq!(events[0].event_type, "leads_status_bulk_updated");
    assert_eq!(events[0].batch_id.as_deref(), Some(out.batch_id.as_str()));
}

#[test]
fn bulk_status_update_is_all_or_nothing() {
    let o = office();
    let ids = o.all_leads();
    // One lead moves ahead to billable; new -> paid is illegal for the rest.
    o.desk.update_status(&o.admin, ids[0], LeadStatus::Billable).unwrap();
    let err = o
        .desk
        .bulk_update_status(&o.admin, &ids, LeadStatus::Paid)
        .unwrap_err();
    assert!(matches!(err, DeskError::IllegalTransition { from: LeadStatus::New, to: LeadStatus::Paid }));
    assert_eq!(o.desk.get_lead(&o.admin, ids[0]).unwrap().status, LeadStatus::Billable);
    for &id in &ids[1..] {
        assert_eq!(o.desk.get_lead(&o.admin, id).unwrap().status, LeadStatus::New);
    }
}

#[test]
fn manager_bulk_update_rejects_leads_outside_team() {
    let o = office();
    let mut ids = o.leads_of(&[o.north_a.user_id]);
    ids.extend(o.leads_of(&[o.south_a.user_id]));
    assert!(matches!(
        o.desk.bulk_update_status(&o.north, &ids, LeadStatus::BadLead),
        Err(DeskError::NotVisible { .. })
    ));
    for id in ids {
        assert_eq!(o.desk.get_lead(&o.admin, id).unwrap().status, LeadStatus::New);
    }

    let team = o.leads_of(&[o.north_a.user_id, o.north_b.user_id]);
    let out = o
        .desk
        .bulk_update_status(&o.north, &team, LeadStatus::Returned)
        .unwrap();
    assert_eq!(out.affected, team.len());
}

#[test]
fn bulk_chunks_stay_in_one_transaction() {
    let mut o = office();
    o.desk.config.settings.bulk_chunk_size = 2;
    let ids = o.all_leads();
    let out = o.desk.bulk_update_status(&o.admin, &ids, LeadStatus::BadLead).unwrap();
    assert_eq!(out.affected, ids.len());
    assert_eq!(o.desk.store.events_of_type("leads_status_bulk_updated").unwrap(), 1);
}

#[test]
fn status_moves_walk_the_lifecycle() {
    let o = office();
    let id = o.all_leads()[0];
    let walk = [
        LeadStatus::Billable,
        LeadStatus::Paid,
        LeadStatus::BadLead,
        LeadStatus::Billable,
        LeadStatus::DeductedReturn,
        LeadStatus::New,
    ];
    for to in walk {
        o.desk.update_status(&o.admin, id, to).unwrap();
    }
    assert!(matches!(
        o.desk.update_status(&o.admin, id, LeadStatus::Paid),
        Err(DeskError::IllegalTransition { from: LeadStatus::New, to: LeadStatus::Paid })
    ));
    assert_eq!(o.desk.store.events_of_type("lead_status_changed").unwrap(), walk.len() as i64);
}

#[test]
fn lateral_statuses_are_reachable_from_every_status() {
    let o = office();
    let ids = o.all_leads();
    let starts = [LeadStatus::New, LeadStatus::Billable, LeadStatus::Paid];
    for (id, start) in ids.iter().zip(starts) {
        if start == LeadStatus::Paid {
            o.desk.update_status(&o.admin, *id, LeadStatus::Billable).unwrap();
        }
        o.desk.update_status(&o.admin, *id, start).unwrap();
        for to in LeadStatus::LATERAL {
            assert_eq!(o.desk.update_status(&o.admin, *id, to).unwrap(), start);
            o.desk.update_status(&o.admin, *id, start).unwrap();
        }
    }
}

#[test]
fn status_change_moves_lead_between_views() {
    let mut o = office();
    let admin = o.admin.clone();
    let id = o.all_leads()[0];
    o.desk.update_status(&admin, id, LeadStatus::Billable).unwrap();
    let queue = o.desk.list_view(&admin, ViewKind::Leads, &ViewQuery::default()).unwrap();
    assert!(!queue.lead_ids().contains(&id));
    let payable = o.desk.list_view(&admin, ViewKind::Payable, &ViewQuery::default()).unwrap();
    assert_eq!(payable.lead_ids(), vec![id]);
}

#[test]
fn duplicate_phone_is_rejected_on_create() {
    let o = office();
    let err = o.desk.create_lead(&o.north_a, &details(1, &o.refs)).unwrap_err();
    assert!(matches!(err, DeskError::Validation { ref field, .. } if field == "patient_phone"));

    let mut form = details(500, &o.refs);
    form.medicare_id = "MC00000001".into();
    let err = o.desk.create_lead(&o.north_a, &form).unwrap_err();
    assert!(matches!(err, DeskError::Validation { ref field, .. } if field == "medicare_id"));
}

#[test]
fn import_skips_bad_records_and_keeps_the_rest() {
    let o = office();
    let mut missing_name = details(902, &o.refs);
    missing_name.first_name = "  ".into();
    let forms = vec![
        details(900, &o.refs),
        details(1, &o.refs), // phone already on file
        details(901, &o.refs),
        missing_name,
    ];
    let report = o.desk.import_leads(&o.loner, &forms).unwrap();
    assert_eq!(report.created.len(), 2);
    let failed: Vec<usize> = report.failed.iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![1, 3]);
    assert_eq!(report.notice.body, "Imported 2 records. 2 failed.");
    for id in report.created {
        assert_eq!(o.desk.get_lead(&o.loner, id).unwrap().user_id, o.loner.user_id);
    }
}

#[test]
fn import_requires_create_capability() {
    let o = office();
    assert!(matches!(
        o.desk.import_leads(&o.admin, &[details(950, &o.refs)]),
        Err(DeskError::Forbidden { .. })
    ));
}

#[test]
fn non_admin_bulk_delete_is_rejected_and_deletes_nothing() {
    let o = office();
    let ids = o.all_leads();
    for caller in [&o.hr, &o.qa, &o.north, &o.north_a] {
        assert!(matches!(
            o.desk.bulk_delete(caller, &ids),
            Err(DeskError::Forbidden { .. })
        ));
    }
    for id in &ids {
        assert!(o.desk.get_lead(&o.admin, *id).is_ok());
    }
    let out = o.desk.bulk_delete(&o.admin, &ids).unwrap();
    assert_eq!(out.affected, ids.len());
    assert!(matches!(
        o.desk.get_lead(&o.admin, ids[0]),
        Err(DeskError::NotFound { entity: "lead", .. })
    ));
}

#[test]
fn referenced_insurance_cannot_be_deleted() {
    let o = office();
    let before = o.all_leads();
    let err = o
        .desk
        .delete_reference(&o.admin, RefEntity::Insurance, o.refs.insurance)
        .unwrap_err();
    assert!(matches!(
        err,
        DeskError::ReferentialIntegrity { entity: "insurance", lead_count, .. } if lead_count == before.len() as i64
    ));
    let insurances = o.desk.list_references(RefEntity::Insurance).unwrap();
    assert_eq!(insurances.len(), 1);
    assert_eq!(insurances[0].lead_count, before.len() as i64);
    for id in before {
        assert_eq!(o.desk.get_lead(&o.admin, id).unwrap().insurance_name, "Humana");
    }
}

#[test]
fn bulk_reference_delete_checks_the_whole_batch_first() {
    let o = office();
    let unused = o
        .desk
        .create_reference(&o.admin, RefEntity::Insurance, "Cigna")
        .unwrap();
    assert!(o
        .desk
        .bulk_delete_references(&o.admin, RefEntity::Insurance, &[unused, o.refs.insurance])
        .is_err());
    assert_eq!(o.desk.list_references(RefEntity::Insurance).unwrap().len(), 2);

    let out = o
        .desk
        .bulk_delete_references(&o.admin, RefEntity::Insurance, &[unused])
        .unwrap();
    assert_eq!(out.affected, 1);
}

#[test]
fn export_returns_only_selected_rows_in_view() {
    let o = office();
    let mine = o.leads_of(&[o.north_a.user_id]);
    let someone_elses = o.leads_of(&[o.south_a.user_id])[0];
    let mut selection = mine.clone();
    selection.push(someone_elses);
    let rows = o
        .desk
        .select_for_export(&o.north_a, ViewKind::Leads, &ViewQuery::default(), &selection)
        .unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, mine);
}
