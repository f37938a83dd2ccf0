//! Type scans, filters, and statement evaluation

use crate::common::*;

fn book(t: &TestStore, doctor: &DocId, patient: &DocId, at: i64) -> Appointment {
    t.appointments
        .create(NewAppointment {
            doctor: doctor.clone(),
            patient: patient.clone(),
            appointment: at,
        })
        .unwrap()
}

#[test]
fn query_by_type_returns_only_that_type() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let p = t.patient("Pat");
    book(&t, &d.id, &p.id, 100);

    assert_eq!(t.store.query_by_type(DocType::Doctor, None).unwrap().len(), 1);
    assert_eq!(t.store.query_by_type(DocType::Patient, None).unwrap().len(), 1);
    assert_eq!(t.store.query_by_type(DocType::Appointment, None).unwrap().len(), 1);
}

#[test]
fn appointments_by_doctor_and_patient() {
    let t = TestStore::new();
    let d1 = t.doctor("Ann", "ER");
    let d2 = t.doctor("Bob", "ICU");
    let p1 = t.patient("Pat");
    let p2 = t.patient("Quinn");
    let a = book(&t, &d1.id, &p1.id, 1);
    let b = book(&t, &d1.id, &p2.id, 2);
    let c = book(&t, &d2.id, &p1.id, 3);

    let mut for_d1: Vec<DocId> = t
        .doctors
        .appointments(&d1.id)
        .unwrap()
        .into_iter()
        .map(|x| x.id)
        .collect();
    for_d1.sort();
    let mut expected = vec![a.id.clone(), b.id];
    expected.sort();
    assert_eq!(for_d1, expected);

    let mut for_p1: Vec<DocId> = t
        .patients
        .appointments(&p1.id)
        .unwrap()
        .into_iter()
        .map(|x| x.id)
        .collect();
    for_p1.sort();
    let mut expected = vec![a.id, c.id];
    expected.sort();
    assert_eq!(for_p1, expected);
}

#[test]
fn filter_on_nested_field() {
    let t = TestStore::new();
    t.doctor("Ann", "ER");
    t.doctor("Bob", "ER");
    let found = t
        .store
        .query_by_type(
            DocType::Doctor,
            Some(FieldEq::new("information.firstname", "Bob")),
        )
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].payload["information"]["firstname"], "Bob");
}

#[test]
fn statement_rows_include_id() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let rows = t
        .store
        .query(
            &Statement::select(DocType::Doctor)
                .filter(Predicate::eq("department", "dept"))
                .bind("dept", "ER"),
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!(d.id.as_str()));
    assert_eq!(rows[0]["type"], "doctor");
}

#[test]
fn field_projection() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let rows = t
        .store
        .query(&Statement::select(DocType::Doctor).project(Projection::fields(&["department"])))
        .unwrap();
    assert_eq!(rows, vec![json!({"department": "ER", "id": d.id.as_str()})]);
}

#[test]
fn unbound_parameter_is_store_error() {
    let t = TestStore::new();
    let err = t
        .store
        .query(&Statement::select(DocType::Appointment).filter(Predicate::eq("doctor", "id")))
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(err.code(), codes::QUERY_ERROR);
}

#[test]
fn hostile_parameter_matches_literally() {
    let t = TestStore::new();
    t.doctor("Ann", "ER");
    for hostile in ["' OR type = 'doctor", "ER' --", "$id"] {
        let rows = t
            .store
            .query(
                &Statement::select(DocType::Doctor)
                    .filter(Predicate::eq("department", "d"))
                    .bind("d", hostile),
            )
            .unwrap();
        assert!(rows.is_empty(), "{} matched", hostile);
    }
}

#[test]
fn rendered_statement_keeps_placeholders() {
    let stmt = Statement::select(DocType::Appointment)
        .filter(Predicate::eq("doctor", "id"))
        .bind("id", "x' OR '1'='1");
    let text = stmt.render("default");
    assert!(text.contains("doctor = $id"));
    assert!(!text.contains("OR '1'='1"));
}
