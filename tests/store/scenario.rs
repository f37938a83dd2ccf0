//! End-to-end walk through doctors, patients, notes and listings

use crate::common::*;

#[test]
fn emergency_room_scenario() {
    let t = TestStore::new();

    let d = t.doctor("Derek", "Emergency Room");
    assert_eq!(d.department, "Emergency Room");
    let p = t.patient("Pat");

    let doctor = t.assign(&d.id, &p.id);
    assert_eq!(doctor.patients, vec![p.id.clone()]);

    let unserviced = t.doctors.patients(&d.id, false).unwrap();
    assert_eq!(unserviced.len(), 1);
    assert_eq!(unserviced[0].id, p.id);

    assert!(t.doctors.patients(&d.id, true).unwrap().is_empty());
    t.note(&p.id, &d.id, "Admitted with chest pain");
    let serviced = t.doctors.patients(&d.id, true).unwrap();
    assert_eq!(serviced.len(), 1);
    assert_eq!(serviced[0].id, p.id);
    assert_eq!(serviced[0].information["firstname"], p.information.first_name.as_str());

    let appointment = t
        .appointments
        .create(NewAppointment {
            doctor: d.id.clone(),
            patient: p.id.clone(),
            appointment: 1_700_000_000_000,
        })
        .unwrap();
    assert_eq!(t.doctors.appointments(&d.id).unwrap(), vec![appointment.clone()]);
    assert_eq!(t.patients.appointments(&p.id).unwrap(), vec![appointment.clone()]);

    let hits = t
        .patients
        .search_conditions(ConditionSearch {
            search: "chest".to_string(),
            fuzziness: None,
        })
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits.hits[0].id, p.id);

    let removed = t
        .appointments
        .delete(AppointmentDelete {
            appointment_id: appointment.id.clone(),
        })
        .unwrap();
    assert_eq!(removed, vec![appointment]);
    assert!(t.doctors.appointments(&d.id).unwrap().is_empty());
}
