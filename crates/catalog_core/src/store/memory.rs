//! In-memory implementation of [`Storager`].
//!
//! # Responsibility
//! - Reference backend for tests, embedded use and ephemeral servers.
//!
//! # Invariants
//! - One `RwLock` per entity kind. The occurrence lock guards the occurrence
//!   table and the relationship index together.
//! - Lock order is notes → occurrences. No method acquires the notes lock
//!   while holding the occurrences lock.

use crate::model::note::Note;
use crate::model::occurrence::Occurrence;
use crate::model::operation::Operation;
use crate::model::project::Project;
use crate::model::Resource;
use crate::name::{
    format_note, format_occurrence, format_operation, format_project, project_scope_prefix,
    ResourceKind,
};
use crate::store::filter::Filter;
use crate::store::index::RelationshipIndex;
use crate::store::page::{ListRequest, Page, PageWindow, DEFAULT_MAX_PAGE_SIZE};
use crate::store::table::EntityTable;
use crate::store::{check_replacement, Storager, StoreError, StoreResult};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const PROJECT_PREFIX: &str = "projects/";

#[derive(Debug, Default)]
struct OccurrenceState {
    table: EntityTable<Occurrence>,
    by_note: RelationshipIndex,
}

/// Thread-safe in-memory catalog.
#[derive(Debug)]
pub struct InMemoryStore {
    projects: RwLock<EntityTable<Project>>,
    notes: RwLock<EntityTable<Note>>,
    occurrences: RwLock<OccurrenceState>,
    operations: RwLock<EntityTable<Operation>>,
    max_page_size: u32,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_max_page_size(DEFAULT_MAX_PAGE_SIZE)
    }

    pub fn with_max_page_size(max_page_size: u32) -> Self {
        Self {
            projects: RwLock::default(),
            notes: RwLock::default(),
            occurrences: RwLock::default(),
            operations: RwLock::default(),
            max_page_size,
        }
    }

    fn window(&self, request: &ListRequest) -> StoreResult<PageWindow> {
        PageWindow::from_request(request, self.max_page_size)
    }
}

fn read<'a, T>(lock: &'a RwLock<T>, context: &'static str) -> StoreResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| StoreError::LockPoisoned(context))
}

fn write<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> StoreResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| StoreError::LockPoisoned(context))
}

fn list_scoped<T: Resource>(
    table: &EntityTable<T>,
    prefix: &str,
    window: &PageWindow,
    filter: &Filter,
) -> StoreResult<Page<T>> {
    window.collect(
        table
            .scan(prefix, window.after())
            .filter(|item| filter.matches(*item))
            .cloned(),
    )
}

fn create_in<T: Resource>(lock: &RwLock<EntityTable<T>>, value: &T) -> StoreResult<()> {
    value.validate()?;
    write(lock, T::KIND.as_str())?.create(value.clone())
}

fn get_from<T: Resource>(lock: &RwLock<EntityTable<T>>, name: &str) -> StoreResult<T> {
    read(lock, T::KIND.as_str())?.get(name).cloned()
}

fn update_in<T: Resource>(lock: &RwLock<EntityTable<T>>, name: &str, value: &T) -> StoreResult<()> {
    write(lock, T::KIND.as_str())?
        .update(name, value.clone())
        .map(|_| ())
}

fn delete_from<T: Resource>(lock: &RwLock<EntityTable<T>>, name: &str) -> StoreResult<()> {
    write(lock, T::KIND.as_str())?.delete(name).map(|_| ())
}

fn require_note(notes: &EntityTable<Note>, note_name: &str) -> StoreResult<()> {
    if notes.contains(note_name) {
        Ok(())
    } else {
        Err(StoreError::not_found(ResourceKind::Note, note_name))
    }
}

impl Storager for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn create_project(&self, project_id: &str) -> StoreResult<Project> {
        let project = Project::new(project_id);
        create_in(&self.projects, &project)?;
        Ok(project)
    }

    fn get_project(&self, project_id: &str) -> StoreResult<Project> {
        get_from(&self.projects, &format_project(project_id))
    }

    fn delete_project(&self, project_id: &str) -> StoreResult<()> {
        delete_from(&self.projects, &format_project(project_id))
    }

    fn list_projects(&self, request: &ListRequest) -> StoreResult<Page<Project>> {
        let window = self.window(request)?;
        let filter = Filter::parse(&request.filter);
        let projects = read(&self.projects, "project")?;
        list_scoped(&projects, PROJECT_PREFIX, &window, &filter)
    }

    fn create_note(&self, note: &Note) -> StoreResult<()> {
        create_in(&self.notes, note)
    }

    fn get_note(&self, project_id: &str, note_id: &str) -> StoreResult<Note> {
        get_from(&self.notes, &format_note(project_id, note_id))
    }

    fn update_note(&self, project_id: &str, note_id: &str, note: &Note) -> StoreResult<()> {
        update_in(&self.notes, &format_note(project_id, note_id), note)
    }

    fn delete_note(&self, project_id: &str, note_id: &str) -> StoreResult<()> {
        delete_from(&self.notes, &format_note(project_id, note_id))
    }

    fn list_notes(&self, project_id: &str, request: &ListRequest) -> StoreResult<Page<Note>> {
        let window = self.window(request)?;
        let filter = Filter::parse(&request.filter);
        let notes = read(&self.notes, "note")?;
        list_scoped(&notes, &project_scope_prefix(project_id), &window, &filter)
    }

    fn create_occurrence(&self, occurrence: &Occurrence) -> StoreResult<()> {
        occurrence.validate()?;
        // Held across the occurrence write so the note cannot vanish between
        // the existence check and the insert.
        let notes = read(&self.notes, "note")?;
        let mut state = write(&self.occurrences, "occurrence")?;

        if state.table.contains(&occurrence.name) {
            return Err(StoreError::already_exists(
                ResourceKind::Occurrence,
                occurrence.name.as_str(),
            ));
        }
        require_note(&notes, &occurrence.note_name)?;

        state.table.create(occurrence.clone())?;
        state.by_note.link(&occurrence.note_name, &occurrence.name);
        Ok(())
    }

    fn get_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<Occurrence> {
        let name = format_occurrence(project_id, occurrence_id);
        let state = read(&self.occurrences, "occurrence")?;
        state.table.get(&name).cloned()
    }

    fn update_occurrence(
        &self,
        project_id: &str,
        occurrence_id: &str,
        occurrence: &Occurrence,
    ) -> StoreResult<()> {
        let name = format_occurrence(project_id, occurrence_id);
        check_replacement(&name, occurrence)?;
        let notes = read(&self.notes, "note")?;
        let mut state = write(&self.occurrences, "occurrence")?;

        let previous_note = state.table.get(&name)?.note_name.clone();
        if previous_note != occurrence.note_name {
            require_note(&notes, &occurrence.note_name)?;
        }

        state.table.update(&name, occurrence.clone())?;
        state
            .by_note
            .relink(&previous_note, &occurrence.note_name, &name);
        Ok(())
    }

    fn delete_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<()> {
        let name = format_occurrence(project_id, occurrence_id);
        let mut state = write(&self.occurrences, "occurrence")?;
        let removed = state.table.delete(&name)?;
        state.by_note.unlink(&removed.note_name, &name);
        Ok(())
    }

    fn list_occurrences(
        &self,
        project_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Occurrence>> {
        let window = self.window(request)?;
        let filter = Filter::parse(&request.filter);
        let state = read(&self.occurrences, "occurrence")?;
        list_scoped(
            &state.table,
            &project_scope_prefix(project_id),
            &window,
            &filter,
        )
    }

    fn get_note_by_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<Note> {
        let note_name = {
            let state = read(&self.occurrences, "occurrence")?;
            state
                .table
                .get(&format_occurrence(project_id, occurrence_id))?
                .note_name
                .clone()
        };
        get_from(&self.notes, &note_name)
    }

    fn list_note_occurrences(
        &self,
        project_id: &str,
        note_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Occurrence>> {
        let note_name = format_note(project_id, note_id);
        let window = self.window(request)?;
        let filter = Filter::parse(&request.filter);

        let notes = read(&self.notes, "note")?;
        require_note(&notes, &note_name)?;
        let state = read(&self.occurrences, "occurrence")?;

        let mut items = Vec::new();
        for occurrence_name in state.by_note.occurrences_of(&note_name, window.after()) {
            let occurrence = state.table.get(occurrence_name)?;
            if !filter.matches(occurrence) {
                continue;
            }
            items.push(occurrence.clone());
            if window.is_overfull(items.len()) {
                break;
            }
        }
        window.finish(items)
    }

    fn create_operation(&self, operation: &Operation) -> StoreResult<()> {
        create_in(&self.operations, operation)
    }

    fn get_operation(&self, project_id: &str, operation_id: &str) -> StoreResult<Operation> {
        get_from(&self.operations, &format_operation(project_id, operation_id))
    }

    fn update_operation(
        &self,
        project_id: &str,
        operation_id: &str,
        operation: &Operation,
    ) -> StoreResult<()> {
        update_in(
            &self.operations,
            &format_operation(project_id, operation_id),
            operation,
        )
    }

    fn delete_operation(&self, project_id: &str, operation_id: &str) -> StoreResult<()> {
        delete_from(&self.operations, &format_operation(project_id, operation_id))
    }

    fn list_operations(
        &self,
        project_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Operation>> {
        let window = self.window(request)?;
        let filter = Filter::parse(&request.filter);
        let operations = read(&self.operations, "operation")?;
        list_scoped(
            &operations,
            &project_scope_prefix(project_id),
            &window,
            &filter,
        )
    }
}
