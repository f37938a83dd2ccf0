//! Key operations: insert, get, typed get

use crate::common::*;
use clinicdb::error::NOT_FOUND_MESSAGE;

#[test]
fn get_returns_inserted_payload_with_server_fields() {
    let t = TestStore::new();
    let payload = json!({
        "information": {"firstname": "Ada", "lastname": "King", "gender": "female"},
        "department": "Cardiology",
        "type": "appointment",
        "timestamp": 42,
        "id": "caller-chosen"
    });
    let before = now_millis();
    let inserted = t
        .store
        .insert(DocId::new("doc-1"), DocType::Doctor, payload)
        .unwrap();

    let fetched = t.store.get(&DocId::new("doc-1")).unwrap();
    assert_eq!(fetched, inserted);
    assert_eq!(fetched.doc_type, DocType::Doctor);
    assert!(fetched.timestamp >= before);
    assert_eq!(fetched.payload["department"], "Cardiology");
    assert!(!fetched.payload.contains_key("type"));
    assert!(!fetched.payload.contains_key("timestamp"));
    assert!(!fetched.payload.contains_key("id"));
}

#[test]
fn stored_body_is_flat() {
    let t = TestStore::new();
    let doc = t.store.create(DocType::Patient, json!({"notes": []})).unwrap();
    let raw = t.store.backend().get(&doc.id).unwrap().unwrap().value;
    assert_eq!(raw["type"], "patient");
    assert_eq!(raw["timestamp"], doc.timestamp);
    assert!(raw.get("id").is_none());
}

#[test]
fn create_generates_distinct_ids() {
    let t = TestStore::new();
    let a = t.store.create(DocType::Patient, json!({})).unwrap();
    let b = t.store.create(DocType::Patient, json!({})).unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(a.id.as_str().len(), 36);
}

#[test]
fn duplicate_insert_fails_and_keeps_first() {
    let t = TestStore::new();
    let first = t
        .store
        .insert(DocId::new("dup"), DocType::Appointment, json!({"appointment": 1}))
        .unwrap();
    let err = t
        .store
        .insert(DocId::new("dup"), DocType::Doctor, json!({"department": "X"}))
        .unwrap_err();

    assert!(matches!(err, Error::KeyExists { .. }));
    assert_eq!(err.code(), codes::KEY_EEXISTS);
    assert_eq!(t.store.get(&DocId::new("dup")).unwrap(), first);
}

#[test]
fn absent_and_wrong_type_are_indistinguishable() {
    let t = TestStore::new();
    let patient = t.patient("Pat");

    let absent = t.doctors.get(&DocId::new("no-such-id")).unwrap_err();
    let wrong_type = t.doctors.get(&patient.id).unwrap_err();

    assert!(absent.is_not_found());
    assert!(wrong_type.is_not_found());
    assert_eq!(absent.body(), wrong_type.body());
    assert_eq!(
        absent.body(),
        ErrorBody {
            code: codes::KEY_ENOENT,
            message: NOT_FOUND_MESSAGE.to_string(),
        }
    );
}

#[test]
fn error_body_serializes_as_code_and_message() {
    let body = Error::key_exists("x").body();
    assert_eq!(
        serde_json::to_value(&body).unwrap(),
        json!({"code": 12, "message": "The key already exists in the server"})
    );
}

#[test]
fn typed_records_carry_id() {
    let t = TestStore::new();
    let doctor = t.doctor("Ben", "Radiology");
    let patient = t.patient("Pat");
    assert_eq!(t.doctors.get(&doctor.id).unwrap().id, doctor.id);
    assert_eq!(t.patients.get(&patient.id).unwrap().information.first_name, "Pat");
    assert_eq!(t.doctors.list().unwrap().len(), 1);
    assert_eq!(t.patients.list().unwrap().len(), 1);
}

#[test]
fn inbound_payload_rejects_server_fields() {
    let result: Result<NewPatient> = parse_payload(json!({
        "information": {"firstname": "A", "lastname": "B", "gender": "x"},
        "timestamp": 5
    }));
    assert!(matches!(result.unwrap_err(), Error::ValidationFailed(_)));
}
