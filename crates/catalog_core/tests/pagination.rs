mod common;

use catalog_core::name::format_occurrence;
use catalog_core::{
    InMemoryStore, ListRequest, Note, Occurrence, Operation, SqliteStore, StoreError, Storager,
};
use common::{collect_pages, names, test_note, test_occurrence, NOTE_ID, NOTE_PROJECT};
use std::collections::BTreeSet;

fn backends() -> Vec<Box<dyn Storager>> {
    vec![
        Box::new(InMemoryStore::new()),
        Box::new(SqliteStore::open_in_memory().unwrap()),
    ]
}

fn seed(store: &dyn Storager) {
    for i in 0..10 {
        store.create_project(&format!("p{i:02}")).unwrap();
        store.create_operation(&Operation::new("ops", &format!("op{i}"))).unwrap();
        store.create_note(&Note::new("notes", &format!("n{i}"))).unwrap();
    }
    let note = test_note(NOTE_PROJECT);
    store.create_note(&note).unwrap();
    for i in 0..11 {
        let project_id = if i % 2 == 0 { "even" } else { "odd" };
        store
            .create_occurrence(&Occurrence {
                name: format_occurrence(project_id, &format!("o{i:02}")),
                ..test_occurrence(project_id, &note.name)
            })
            .unwrap();
    }
}

fn assert_same_listing<T: catalog_core::Resource>(paged: Vec<T>, unbounded: Vec<T>) {
    let paged = names(&paged);
    let unique: BTreeSet<_> = paged.iter().cloned().collect();
    assert_eq!(unique.len(), paged.len(), "duplicate items across pages");
    assert_eq!(paged, names(&unbounded));
}

#[test]
fn paging_by_three_matches_unbounded_listing() {
    for store in backends() {
        let store = store.as_ref();
        seed(store);

        let all = store.list_projects(&ListRequest::all()).unwrap().items;
        assert_eq!(all.len(), 10);
        assert_same_listing(collect_pages(3, |r| store.list_projects(r)), all);

        let all = store.list_operations("ops", &ListRequest::all()).unwrap().items;
        assert_same_listing(collect_pages(3, |r| store.list_operations("ops", r)), all);

        let all = store.list_notes("notes", &ListRequest::all()).unwrap().items;
        assert_same_listing(collect_pages(3, |r| store.list_notes("notes", r)), all);

        let all = store.list_occurrences("even", &ListRequest::all()).unwrap().items;
        assert_eq!(all.len(), 6);
        assert_same_listing(collect_pages(3, |r| store.list_occurrences("even", r)), all);

        let all = store
            .list_note_occurrences(NOTE_PROJECT, NOTE_ID, &ListRequest::all())
            .unwrap()
            .items;
        assert_eq!(all.len(), 11);
        assert_same_listing(
            collect_pages(3, |r| store.list_note_occurrences(NOTE_PROJECT, NOTE_ID, r)),
            all,
        );
    }
}

#[test]
fn exact_multiple_ends_with_empty_token() {
    for store in backends() {
        for i in 0..6 {
            store.create_project(&format!("p{i}")).unwrap();
        }
        let first = store.list_projects(&ListRequest::first_page(3)).unwrap();
        assert_eq!(first.items.len(), 3);
        assert!(!first.is_last());

        let second = store
            .list_projects(&ListRequest::first_page(3).next_page(&first))
            .unwrap();
        assert_eq!(second.items.len(), 3);
        assert!(second.is_last());
    }
}

#[test]
fn page_size_is_clamped_to_backend_maximum() {
    let stores: Vec<Box<dyn Storager>> = vec![
        Box::new(InMemoryStore::with_max_page_size(4)),
        Box::new(SqliteStore::open_in_memory().unwrap().with_max_page_size(4)),
    ];
    for store in stores {
        for i in 0..9 {
            store.create_project(&format!("p{i}")).unwrap();
        }
        let page = store.list_projects(&ListRequest::first_page(100)).unwrap();
        assert_eq!(page.items.len(), 4);
        assert!(!page.is_last());

        let unbounded = store.list_projects(&ListRequest::all()).unwrap();
        assert_eq!(unbounded.items.len(), 9);
        assert!(unbounded.is_last());
    }
}

#[test]
fn listing_continues_after_deleted_cursor_item() {
    for store in backends() {
        for id in ["a", "b", "c", "d"] {
            store.create_project(id).unwrap();
        }
        let first = store.list_projects(&ListRequest::first_page(2)).unwrap();
        assert_eq!(names(&first.items), vec!["projects/a", "projects/b"]);

        store.delete_project("b").unwrap();
        let second = store
            .list_projects(&ListRequest::first_page(2).next_page(&first))
            .unwrap();
        assert_eq!(names(&second.items), vec!["projects/c", "projects/d"]);
    }
}

#[test]
fn garbage_token_is_invalid() {
    for store in backends() {
        let request = ListRequest {
            page_token: "not-a-token".to_string(),
            ..ListRequest::first_page(3)
        };
        let err = store.list_projects(&request).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPageToken(_)));
    }
}
