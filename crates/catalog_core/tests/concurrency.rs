mod common;

use catalog_core::name::format_occurrence;
use catalog_core::{InMemoryStore, ListRequest, Occurrence, SqliteStore, Storager};
use common::{test_note, test_occurrence, NOTE_ID, NOTE_PROJECT};
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;

fn backends() -> Vec<Arc<dyn Storager>> {
    vec![
        Arc::new(InMemoryStore::new()),
        Arc::new(SqliteStore::open_in_memory().unwrap()),
    ]
}

#[test]
fn same_name_create_has_exactly_one_winner() {
    for store in backends() {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.create_project("contested"))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "backend {}", store.backend_name());
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|err| err.is_already_exists()));
    }
}

#[test]
fn concurrent_occurrence_creates_all_land_in_index() {
    for store in backends() {
        let note = test_note(NOTE_PROJECT);
        store.create_note(&note).unwrap();

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let store = Arc::clone(&store);
                let note_name = note.name.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        let project_id = format!("tenant-{t}");
                        let occurrence = Occurrence {
                            name: format_occurrence(&project_id, &format!("o{i}")),
                            ..test_occurrence(&project_id, &note_name)
                        };
                        store.create_occurrence(&occurrence).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let linked = store
            .list_note_occurrences(NOTE_PROJECT, NOTE_ID, &ListRequest::all())
            .unwrap();
        assert_eq!(linked.items.len(), THREADS * 10);
    }
}

#[test]
fn readers_run_alongside_writers() {
    for store in backends() {
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50 {
                    store.create_project(&format!("p{i:02}")).unwrap();
                }
            })
        };
        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut last_seen = 0;
                for _ in 0..50 {
                    let count = store.list_projects(&ListRequest::all()).unwrap().items.len();
                    assert!(count >= last_seen);
                    last_seen = count;
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(
            store.list_projects(&ListRequest::all()).unwrap().items.len(),
            50
        );
    }
}
