//! Concurrent access: no lost updates, single winners

use crate::common::*;

const THREADS: usize = 8;

#[test]
fn concurrent_append_unique_distinct_values_loses_nothing() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let per_thread = 10;
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let store = t.store.clone();
            let barrier = barrier.clone();
            let doctor = d.id.clone();
            thread::spawn(move || {
                barrier.wait();
                for j in 0..per_thread {
                    store
                        .append_unique(&doctor, "patients", json!(format!("p-{}-{}", i, j)))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let patients = t.doctors.get(&d.id).unwrap().patients;
    assert_eq!(patients.len(), THREADS * per_thread);
    let unique: BTreeSet<_> = patients.iter().collect();
    assert_eq!(unique.len(), patients.len());
}

#[test]
fn concurrent_append_unique_same_value_stores_once() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let p = t.patient("Pat");
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let doctors = t.doctors.clone();
            let barrier = barrier.clone();
            let assignment = PatientAssignment {
                doctor: d.id.clone(),
                patient: p.id.clone(),
            };
            thread::spawn(move || {
                barrier.wait();
                doctors.assign_patient(assignment).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(t.doctors.get(&d.id).unwrap().patients, vec![p.id]);
}

#[test]
fn concurrent_note_appends_all_land() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let p = t.patient("Pat");
    let per_thread = 5;
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let patients = t.patients.clone();
            let barrier = barrier.clone();
            let (patient, doctor) = (p.id.clone(), d.id.clone());
            thread::spawn(move || {
                barrier.wait();
                for j in 0..per_thread {
                    patients
                        .add_note(
                            &patient,
                            NewNote {
                                doctor: doctor.clone(),
                                message: format!("note {} {}", i, j),
                            },
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(t.patients.get(&p.id).unwrap().notes.len(), THREADS * per_thread);
}

#[test]
fn concurrent_insert_same_id_has_one_winner() {
    let t = TestStore::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let store = t.store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                store.insert(DocId::new("shared"), DocType::Patient, json!({"writer": i}))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<&Document> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.code() == codes::KEY_EEXISTS));
    assert_eq!(&t.store.get(&DocId::new("shared")).unwrap(), winners[0]);
}

#[test]
fn concurrent_delete_returns_document_once() {
    let t = TestStore::new();
    let a = t
        .appointments
        .create(NewAppointment {
            doctor: DocId::new("d"),
            patient: DocId::new("p"),
            appointment: 1,
        })
        .unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let appointments = t.appointments.clone();
            let barrier = barrier.clone();
            let request = AppointmentDelete {
                appointment_id: a.id.clone(),
            };
            thread::spawn(move || {
                barrier.wait();
                appointments.delete(request).unwrap().len()
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 1);
}

fn hammer_append_unique(store: &Arc<DocumentStore>, doctor: &DocId, threads: usize, per_thread: usize) -> usize {
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let store = store.clone();
            let barrier = barrier.clone();
            let doctor = doctor.clone();
            thread::spawn(move || {
                barrier.wait();
                (0..per_thread)
                    .filter(|j| {
                        store
                            .append_unique(&doctor, "patients", json!(format!("p-{}-{}", i, j)))
                            .is_err()
                    })
                    .count()
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).sum()
}

#[test]
fn heavy_contention_with_default_config_never_conflicts() {
    let t = TestStore::new();
    assert_eq!(t.store.config().retry, RetryConfig::default());
    let d = t.doctor("Ann", "ER");

    let failed = hammer_append_unique(&t.store, &d.id, 32, 100);
    assert_eq!(failed, 0);
    assert_eq!(t.doctors.get(&d.id).unwrap().patients.len(), 32 * 100);
}

#[test]
fn in_process_appends_need_no_retry_budget() {
    let t = TestStore::with_retry(RetryConfig::no_retry());
    let d = t.doctor("Ann", "ER");

    let failed = hammer_append_unique(&t.store, &d.id, THREADS, 50);
    assert_eq!(failed, 0);
    assert_eq!(t.doctors.get(&d.id).unwrap().patients.len(), THREADS * 50);
}

#[test]
fn cas_only_backend_retries_to_completion() {
    let t = TestStore::with_backend(Arc::new(CasOnlyBackend::default()), generous_retry());
    let d = t.doctor("Ann", "ER");

    let failed = hammer_append_unique(&t.store, &d.id, THREADS, 20);
    assert_eq!(failed, 0);
    assert_eq!(t.doctors.get(&d.id).unwrap().patients.len(), THREADS * 20);
}

#[test]
fn cas_only_backend_without_retry_surfaces_conflict() {
    let t = TestStore::with_backend(Arc::new(CasOnlyBackend::default()), RetryConfig::no_retry());
    let d = t.doctor("Ann", "ER");
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let store = t.store.clone();
            let barrier = barrier.clone();
            let doctor = d.id.clone();
            thread::spawn(move || {
                barrier.wait();
                store.append_unique(&doctor, "patients", json!(i))
            })
        })
        .collect();

    let mut applied = 0;
    for h in handles {
        match h.join().unwrap() {
            Ok(_) => applied += 1,
            Err(e) => assert_eq!(e.code(), codes::CAS_CONFLICT),
        }
    }
    let stored = t.store.get(&d.id).unwrap().payload["patients"]
        .as_array()
        .unwrap()
        .len();
    assert_eq!(stored, applied);
}
