//! Catalog use-case service.
//!
//! # Responsibility
//! - Provide stable entry points over any `Storager` backend.
//! - Emit one `catalog_mutation` event per write with timing and outcome.
//! - Offer drain helpers that follow page tokens to exhaustion.
//!
//! # Invariants
//! - Service APIs never bypass backend validation or atomicity contracts.
//! - Reads are passed through unchanged and are not logged.

use crate::logging::sanitize_message;
use crate::model::note::Note;
use crate::model::occurrence::Occurrence;
use crate::model::operation::Operation;
use crate::model::project::Project;
use crate::model::Resource;
use crate::name::{format_note, format_occurrence, format_operation, format_project, ResourceKind};
use crate::store::{ListRequest, Page, Storager, StoreResult};
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

const DRAIN_PAGE_SIZE: u32 = 256;
const MAX_LOGGED_NAME_CHARS: usize = 240;

/// Use-case wrapper shared by CLI and embedding callers.
pub struct CatalogService<S: Storager + ?Sized = dyn Storager> {
    store: Arc<S>,
}

impl<S: Storager + ?Sized> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Storager + ?Sized> CatalogService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Direct access to the wrapped backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn create_project(&self, project_id: &str) -> StoreResult<Project> {
        record("create", ResourceKind::Project, &format_project(project_id), || {
            self.store.create_project(project_id)
        })
    }

    pub fn get_project(&self, project_id: &str) -> StoreResult<Project> {
        self.store.get_project(project_id)
    }

    pub fn delete_project(&self, project_id: &str) -> StoreResult<()> {
        record("delete", ResourceKind::Project, &format_project(project_id), || {
            self.store.delete_project(project_id)
        })
    }

    pub fn list_projects(&self, request: &ListRequest) -> StoreResult<Page<Project>> {
        self.store.list_projects(request)
    }

    pub fn list_all_projects(&self, filter: &str) -> StoreResult<Vec<Project>> {
        drain(filter, |request| self.store.list_projects(request))
    }

    pub fn create_note(&self, note: &Note) -> StoreResult<()> {
        record("create", Note::KIND, &note.name, || self.store.create_note(note))
    }

    pub fn get_note(&self, project_id: &str, note_id: &str) -> StoreResult<Note> {
        self.store.get_note(project_id, note_id)
    }

    pub fn update_note(&self, project_id: &str, note_id: &str, note: &Note) -> StoreResult<()> {
        record("update", Note::KIND, &format_note(project_id, note_id), || {
            self.store.update_note(project_id, note_id, note)
        })
    }

    pub fn delete_note(&self, project_id: &str, note_id: &str) -> StoreResult<()> {
        record("delete", Note::KIND, &format_note(project_id, note_id), || {
            self.store.delete_note(project_id, note_id)
        })
    }

    pub fn list_notes(&self, project_id: &str, request: &ListRequest) -> StoreResult<Page<Note>> {
        self.store.list_notes(project_id, request)
    }

    pub fn list_all_notes(&self, project_id: &str, filter: &str) -> StoreResult<Vec<Note>> {
        drain(filter, |request| self.store.list_notes(project_id, request))
    }

    pub fn create_occurrence(&self, occurrence: &Occurrence) -> StoreResult<()> {
        record("create", Occurrence::KIND, &occurrence.name, || {
            self.store.create_occurrence(occurrence)
        })
    }

    pub fn get_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<Occurrence> {
        self.store.get_occurrence(project_id, occurrence_id)
    }

    pub fn update_occurrence(
        &self,
        project_id: &str,
        occurrence_id: &str,
        occurrence: &Occurrence,
    ) -> StoreResult<()> {
        let name = format_occurrence(project_id, occurrence_id);
        record("update", Occurrence::KIND, &name, || {
            self.store
                .update_occurrence(project_id, occurrence_id, occurrence)
        })
    }

    pub fn delete_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<()> {
        let name = format_occurrence(project_id, occurrence_id);
        record("delete", Occurrence::KIND, &name, || {
            self.store.delete_occurrence(project_id, occurrence_id)
        })
    }

    pub fn list_occurrences(
        &self,
        project_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Occurrence>> {
        self.store.list_occurrences(project_id, request)
    }

    pub fn list_all_occurrences(
        &self,
        project_id: &str,
        filter: &str,
    ) -> StoreResult<Vec<Occurrence>> {
        drain(filter, |request| self.store.list_occurrences(project_id, request))
    }

    pub fn get_note_by_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<Note> {
        self.store.get_note_by_occurrence(project_id, occurrence_id)
    }

    pub fn list_note_occurrences(
        &self,
        project_id: &str,
        note_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Occurrence>> {
        self.store
            .list_note_occurrences(project_id, note_id, request)
    }

    pub fn list_all_note_occurrences(
        &self,
        project_id: &str,
        note_id: &str,
        filter: &str,
    ) -> StoreResult<Vec<Occurrence>> {
        drain(filter, |request| {
            self.store
                .list_note_occurrences(project_id, note_id, request)
        })
    }

    pub fn create_operation(&self, operation: &Operation) -> StoreResult<()> {
        record("create", Operation::KIND, &operation.name, || {
            self.store.create_operation(operation)
        })
    }

    pub fn get_operation(&self, project_id: &str, operation_id: &str) -> StoreResult<Operation> {
        self.store.get_operation(project_id, operation_id)
    }

    pub fn update_operation(
        &self,
        project_id: &str,
        operation_id: &str,
        operation: &Operation,
    ) -> StoreResult<()> {
        let name = format_operation(project_id, operation_id);
        record("update", Operation::KIND, &name, || {
            self.store
                .update_operation(project_id, operation_id, operation)
        })
    }

    pub fn delete_operation(&self, project_id: &str, operation_id: &str) -> StoreResult<()> {
        let name = format_operation(project_id, operation_id);
        record("delete", Operation::KIND, &name, || {
            self.store.delete_operation(project_id, operation_id)
        })
    }

    pub fn list_operations(
        &self,
        project_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Operation>> {
        self.store.list_operations(project_id, request)
    }

    pub fn list_all_operations(&self, project_id: &str, filter: &str) -> StoreResult<Vec<Operation>> {
        drain(filter, |request| self.store.list_operations(project_id, request))
    }

    /// Creates a pending operation under a fresh UUIDv4 id.
    pub fn start_operation(
        &self,
        project_id: &str,
        metadata: Option<serde_json::Value>,
    ) -> StoreResult<Operation> {
        let mut operation = Operation::with_generated_id(project_id);
        operation.metadata = metadata;
        self.create_operation(&operation)?;
        Ok(operation)
    }

    /// Marks an operation done with `response` and returns the stored record.
    ///
    /// Read-modify-write; a concurrent update between the two steps is
    /// overwritten.
    pub fn complete_operation(
        &self,
        project_id: &str,
        operation_id: &str,
        response: serde_json::Value,
    ) -> StoreResult<Operation> {
        let mut operation = self.store.get_operation(project_id, operation_id)?;
        operation.complete(response);
        self.update_operation(project_id, operation_id, &operation)?;
        Ok(operation)
    }

    /// Marks an operation done with an error status.
    pub fn fail_operation(
        &self,
        project_id: &str,
        operation_id: &str,
        code: i32,
        message: &str,
    ) -> StoreResult<Operation> {
        let mut operation = self.store.get_operation(project_id, operation_id)?;
        operation.fail(code, message);
        self.update_operation(project_id, operation_id, &operation)?;
        Ok(operation)
    }
}

fn record<T>(
    op: &'static str,
    kind: ResourceKind,
    name: &str,
    action: impl FnOnce() -> StoreResult<T>,
) -> StoreResult<T> {
    let started_at = Instant::now();
    let result = action();
    let duration_ms = started_at.elapsed().as_millis();
    let name = sanitize_message(name, MAX_LOGGED_NAME_CHARS);

    match &result {
        Ok(_) => info!(
            "event=catalog_mutation module=service status=ok op={} kind={} name={} duration_ms={}",
            op, kind, name, duration_ms
        ),
        Err(err) => warn!(
            "event=catalog_mutation module=service status=error op={} kind={} name={} duration_ms={} error_code={}",
            op,
            kind,
            name,
            duration_ms,
            err.code().as_str()
        ),
    }
    result
}

fn drain<T>(
    filter: &str,
    mut fetch: impl FnMut(&ListRequest) -> StoreResult<Page<T>>,
) -> StoreResult<Vec<T>> {
    let mut request = ListRequest {
        filter: filter.to_string(),
        page_size: Some(DRAIN_PAGE_SIZE),
        ..ListRequest::default()
    };
    let mut items = Vec::new();
    loop {
        let page = fetch(&request)?;
        let next_request = request.next_page(&page);
        let is_last = page.is_last();
        items.extend(page.items);
        if is_last {
            return Ok(items);
        }
        request = next_request;
    }
}
