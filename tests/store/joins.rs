//! Doctor-to-patient listings

use crate::common::*;

#[test]
fn unserviced_lists_assigned_patients_only() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let other = t.doctor("Bob", "ER");
    let p1 = t.patient("Pat");
    let p2 = t.patient("Quinn");
    let p3 = t.patient("Ray");
    t.assign(&d.id, &p1.id);
    t.assign(&d.id, &p2.id);
    t.assign(&other.id, &p3.id);

    let listed = t.doctors.patients(&d.id, false).unwrap();
    assert_eq!(
        TestStore::ids(&listed),
        [p1.id, p2.id].into_iter().collect::<BTreeSet<_>>()
    );
}

#[test]
fn serviced_lists_patients_with_a_note_from_doctor() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let other = t.doctor("Bob", "ER");
    let p1 = t.patient("Pat");
    let p2 = t.patient("Quinn");
    let p3 = t.patient("Ray");
    t.note(&p1.id, &other.id, "first visit");
    t.note(&p1.id, &d.id, "follow-up");
    t.note(&p2.id, &other.id, "checkup");
    t.assign(&d.id, &p3.id);

    let listed = t.doctors.patients(&d.id, true).unwrap();
    assert_eq!(
        TestStore::ids(&listed),
        [p1.id].into_iter().collect::<BTreeSet<_>>()
    );
}

#[test]
fn summary_has_projected_shape() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let p = t.patient("Pat");
    t.assign(&d.id, &p.id);

    let listed = t.doctors.patients(&d.id, false).unwrap();
    assert_eq!(
        listed,
        vec![PatientSummary {
            id: p.id.clone(),
            information: serde_json::to_value(&p.information).unwrap(),
            timestamp: p.timestamp,
            doc_type: DocType::Patient,
        }]
    );

    let row = serde_json::to_value(&listed[0]).unwrap();
    let keys: BTreeSet<&str> = row.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["id", "information", "timestamp", "type"]
            .into_iter()
            .collect::<BTreeSet<_>>()
    );
}

#[test]
fn unknown_doctor_lists_nothing() {
    let t = TestStore::new();
    t.patient("Pat");
    let missing = DocId::new("missing");
    assert!(t.doctors.patients(&missing, false).unwrap().is_empty());
    assert!(t.doctors.patients(&missing, true).unwrap().is_empty());
}

#[test]
fn unserviced_skips_dangling_and_non_patient_ids() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let colleague = t.doctor("Bob", "ER");
    let p = t.patient("Pat");
    t.assign(&d.id, &DocId::new("never-created"));
    t.assign(&d.id, &colleague.id);
    t.assign(&d.id, &p.id);

    let listed = t
        .store
        .query_join_by_reference(JoinMode::Unserviced, &d.id)
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, p.id);
}

#[test]
fn listing_tolerates_nonconforming_patients() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let conforming = t.patient("Pat");
    let extra = t
        .store
        .create(
            DocType::Patient,
            json!({"information": {"firstname": "Al", "lastname": "B", "gender": "m", "age": 40}}),
        )
        .unwrap();
    let bare = t
        .store
        .create(DocType::Patient, json!({"notes": []}))
        .unwrap();
    for id in [&conforming.id, &extra.id, &bare.id] {
        t.assign(&d.id, id);
    }

    let listed = t.doctors.patients(&d.id, false).unwrap();
    assert_eq!(
        TestStore::ids(&listed),
        [conforming.id.clone(), extra.id.clone(), bare.id.clone()]
            .into_iter()
            .collect::<BTreeSet<_>>()
    );
    let by_id = |id: &DocId| listed.iter().find(|s| &s.id == id).unwrap();
    assert_eq!(by_id(&extra.id).information["age"], 40);
    assert_eq!(by_id(&bare.id).information, Value::Null);
}
