//! Property tests for append and listing laws

use crate::common::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// append_unique over any sequence equals first-occurrence dedup
    #[test]
    fn append_unique_is_ordered_dedup(values in prop::collection::vec(0u8..6, 0..20)) {
        let t = TestStore::new();
        let d = t.doctor("Ann", "ER");
        for v in &values {
            t.store.append_unique(&d.id, "patients", json!(format!("p{}", v))).unwrap();
        }

        let mut expected: Vec<String> = Vec::new();
        for v in &values {
            let id = format!("p{}", v);
            if !expected.contains(&id) {
                expected.push(id);
            }
        }
        let stored: Vec<String> = t
            .doctors
            .get(&d.id)
            .unwrap()
            .patients
            .into_iter()
            .map(DocId::into_string)
            .collect();
        prop_assert_eq!(stored, expected);
    }

    /// Repeating the whole sequence changes nothing
    #[test]
    fn append_unique_is_idempotent(values in prop::collection::vec(0u8..6, 1..10)) {
        let t = TestStore::new();
        let d = t.doctor("Ann", "ER");
        for v in &values {
            t.store.append_unique(&d.id, "patients", json!(v)).unwrap();
        }
        let once = t.store.get(&d.id).unwrap();
        for v in &values {
            t.store.append_unique(&d.id, "patients", json!(v)).unwrap();
        }
        prop_assert_eq!(t.store.get(&d.id).unwrap(), once);
    }

    /// Listing membership matches the notes and assignments exactly
    #[test]
    fn listing_membership_laws(
        assigned in prop::collection::vec(any::<bool>(), 4),
        noted_by_doctor in prop::collection::vec(any::<bool>(), 4),
        noted_by_other in prop::collection::vec(any::<bool>(), 4),
    ) {
        let t = TestStore::new();
        let d = t.doctor("Ann", "ER");
        let other = t.doctor("Bob", "ER");

        let mut expect_unserviced = BTreeSet::new();
        let mut expect_serviced = BTreeSet::new();
        for i in 0..4 {
            let p = t.patient(&format!("Pat{}", i));
            if assigned[i] {
                t.assign(&d.id, &p.id);
                expect_unserviced.insert(p.id.clone());
            }
            if noted_by_other[i] {
                t.note(&p.id, &other.id, "seen by colleague");
            }
            if noted_by_doctor[i] {
                t.note(&p.id, &d.id, "seen");
                expect_serviced.insert(p.id.clone());
            }
        }

        let unserviced = t.doctors.patients(&d.id, false).unwrap();
        let serviced = t.doctors.patients(&d.id, true).unwrap();
        prop_assert_eq!(TestStore::ids(&unserviced), expect_unserviced);
        prop_assert_eq!(TestStore::ids(&serviced), expect_serviced);
    }
}
