//! Search pass-through

use crate::common::*;

#[test]
fn hits_are_ordered_by_descending_score() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let once = t.patient("Once");
    let thrice = t.patient("Thrice");
    t.note(&once.id, &d.id, "fever");
    t.note(&thrice.id, &d.id, "fever");
    t.note(&thrice.id, &d.id, "fever again");
    t.note(&thrice.id, &d.id, "still fever");

    let resp = t
        .store
        .search(&SearchQuery::new(DEFAULT_SEARCH_INDEX, "fever"))
        .unwrap();
    assert_eq!(resp.total_hits, 2);
    assert_eq!(resp.hits[0].id, thrice.id);
    assert!(resp.hits[0].score > resp.hits[1].score);
}

#[test]
fn locations_point_at_matched_note() {
    let t = TestStore::new();
    let d = t.doctor("Ann", "ER");
    let p = t.patient("Pat");
    t.note(&p.id, &d.id, "broken wrist");
    t.note(&p.id, &d.id, "mild concussion");

    let resp = t
        .store
        .search(&SearchQuery::new(DEFAULT_SEARCH_INDEX, "concussion"))
        .unwrap();
    let loc = &resp.hits[0].locations["notes.message"]["concussion"][0];
    assert_eq!(loc.array_position, Some(1));
    assert_eq!((loc.start, loc.end), (5, 15));
}

#[test]
fn names_are_searchable() {
    let t = TestStore::new();
    let p = t.patient("Rosalind");
    let resp = t
        .patients
        .search_conditions(ConditionSearch {
            search: "rosalind".to_string(),
            fuzziness: None,
        })
        .unwrap();
    assert_eq!(resp.hits[0].id, p.id);
    assert!(resp.hits[0].locations.contains_key("information.firstname"));
}

#[test]
fn unknown_index_is_store_error() {
    let t = TestStore::new();
    let err = t
        .store
        .search(&SearchQuery::new("no-such-index", "x"))
        .unwrap_err();
    assert_eq!(err.code(), codes::SEARCH_INDEX_NOT_FOUND);
}

#[test]
fn configured_index_name_is_used() {
    let mut config = StoreConfig::default();
    config.search.index = "conditions-v2".to_string();
    let t = TestStore::with_config(config);
    let d = t.doctor("Ann", "ER");
    let p = t.patient("Pat");
    t.note(&p.id, &d.id, "migraine");

    let resp = t
        .patients
        .search_conditions(ConditionSearch {
            search: "migraine".to_string(),
            fuzziness: None,
        })
        .unwrap();
    assert_eq!(resp.hits[0].index, "conditions-v2");
    assert!(t
        .store
        .search(&SearchQuery::new(DEFAULT_SEARCH_INDEX, "migraine"))
        .is_err());
}

#[test]
fn custom_search_service_is_passed_through() {
    struct Canned;
    impl SearchService for Canned {
        fn query(&self, query: &SearchQuery) -> Result<SearchResponse> {
            Ok(SearchResponse {
                hits: vec![SearchHit {
                    index: query.index.clone(),
                    id: DocId::new("canned"),
                    score: 1.5,
                    locations: Locations::new(),
                    fragments: Default::default(),
                    fields: Default::default(),
                }],
                total_hits: 1,
                max_score: 1.5,
                took_micros: 0,
            })
        }
        fn name(&self) -> &str {
            "canned"
        }
    }

    let store = DocumentStore::builder()
        .search(Arc::new(Canned))
        .build()
        .unwrap();
    let resp = store.search(&SearchQuery::new("anything", "x")).unwrap();
    assert_eq!(resp.hits[0].id.as_str(), "canned");
}
