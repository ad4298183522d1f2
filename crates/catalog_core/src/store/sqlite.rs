//! SQLite implementation of [`Storager`].
//!
//! # Responsibility
//! - Persist catalog entities as JSON bodies keyed by canonical name.
//! - Serve the note → occurrences lookup from the indexed `note_name` column.
//!
//! # Invariants
//! - Every mutation runs in one `IMMEDIATE` transaction that performs its
//!   existence checks and writes together.
//! - Stored bodies always decode to an entity whose name equals the row key;
//!   anything else is reported as `InvalidData`.
//! - Listing order is `name ASC`, matching the in-memory backend.

use crate::db::{open_db, open_db_in_memory};
use crate::model::note::Note;
use crate::model::occurrence::Occurrence;
use crate::model::operation::Operation;
use crate::model::project::Project;
use crate::model::Resource;
use crate::name::{
    format_note, format_occurrence, format_operation, format_project, parse_project,
    project_id_of, ResourceKind,
};
use crate::store::filter::Filter;
use crate::store::page::{ListRequest, Page, PageWindow, DEFAULT_MAX_PAGE_SIZE};
use crate::store::{check_replacement, Storager, StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const NOTE_OCCURRENCES_SQL: &str = "SELECT name, body
     FROM occurrences
     WHERE note_name = ?1 AND name > ?2
     ORDER BY name ASC;";

/// SQLite-backed catalog.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    max_page_size: u32,
}

impl SqliteStore {
    /// Opens (and migrates) a catalog database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory catalog database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection returned by `db::open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::LockPoisoned("sqlite connection"))
    }

    /// Runs `body` inside an immediate transaction and commits on success.
    fn write_tx<T>(
        &self,
        body: impl FnOnce(&Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = body(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn window(&self, request: &ListRequest) -> StoreResult<PageWindow> {
        PageWindow::from_request(request, self.max_page_size)
    }

    fn get_body<T: Resource>(&self, table: &'static str, name: &str) -> StoreResult<T> {
        let conn = self.lock()?;
        load_body::<T>(&conn, table, name)?.ok_or_else(|| StoreError::not_found(T::KIND, name))
    }

    fn list_bodies<T: Resource>(
        &self,
        sql: &str,
        scope: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<T>> {
        self.list_bodies_checked(sql, scope, request, |_| Ok(()))
    }

    /// Lists bodies after `precheck` passes, both under one connection guard.
    fn list_bodies_checked<T: Resource>(
        &self,
        sql: &str,
        scope: &str,
        request: &ListRequest,
        precheck: impl FnOnce(&Connection) -> StoreResult<()>,
    ) -> StoreResult<Page<T>> {
        let window = self.window(request)?;
        let filter = Filter::parse(&request.filter);
        let conn = self.lock()?;
        precheck(&*conn)?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params![scope, window.after_or_empty()])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let item = decode_row::<T>(row)?;
            if !filter.matches(&item) {
                continue;
            }
            items.push(item);
            if window.is_overfull(items.len()) {
                break;
            }
        }
        window.finish(items)
    }
}

impl Storager for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn create_project(&self, project_id: &str) -> StoreResult<Project> {
        let project = Project::new(project_id);
        project.validate()?;
        self.write_tx(|tx| {
            if row_exists(tx, "projects", &project.name)? {
                return Err(StoreError::already_exists(
                    ResourceKind::Project,
                    project.name.as_str(),
                ));
            }
            tx.execute("INSERT INTO projects (name) VALUES (?1);", [&project.name])?;
            Ok(())
        })?;
        Ok(project)
    }

    fn get_project(&self, project_id: &str) -> StoreResult<Project> {
        let name = format_project(project_id);
        let conn = self.lock()?;
        if row_exists(&conn, "projects", &name)? {
            Ok(Project { name })
        } else {
            Err(StoreError::not_found(ResourceKind::Project, name))
        }
    }

    fn delete_project(&self, project_id: &str) -> StoreResult<()> {
        let name = format_project(project_id);
        self.write_tx(|tx| delete_row(tx, ResourceKind::Project, "projects", &name))
    }

    fn list_projects(&self, request: &ListRequest) -> StoreResult<Page<Project>> {
        let window = self.window(request)?;
        let filter = Filter::parse(&request.filter);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name
             FROM projects
             WHERE name > ?1
             ORDER BY name ASC;",
        )?;
        let mut rows = stmt.query([window.after_or_empty()])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            parse_project(&name).map_err(|err| {
                StoreError::InvalidData(format!("projects.name `{name}`: {err}"))
            })?;
            let project = Project { name };
            if !filter.matches(&project) {
                continue;
            }
            items.push(project);
            if window.is_overfull(items.len()) {
                break;
            }
        }
        window.finish(items)
    }

    fn create_note(&self, note: &Note) -> StoreResult<()> {
        note.validate()?;
        let project_id = project_id_of(ResourceKind::Note, &note.name)?;
        let body = encode_body(note)?;
        self.write_tx(|tx| {
            if row_exists(tx, "notes", &note.name)? {
                return Err(StoreError::already_exists(
                    ResourceKind::Note,
                    note.name.as_str(),
                ));
            }
            tx.execute(
                "INSERT INTO notes (name, project_id, body) VALUES (?1, ?2, ?3);",
                params![note.name, project_id, body],
            )?;
            Ok(())
        })
    }

    fn get_note(&self, project_id: &str, note_id: &str) -> StoreResult<Note> {
        self.get_body("notes", &format_note(project_id, note_id))
    }

    fn update_note(&self, project_id: &str, note_id: &str, note: &Note) -> StoreResult<()> {
        let name = format_note(project_id, note_id);
        check_replacement(&name, note)?;
        let body = encode_body(note)?;
        self.write_tx(|tx| {
            let changed = tx.execute(
                "UPDATE notes
                 SET body = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE name = ?1;",
                params![name, body],
            )?;
            if changed == 0 {
                return Err(StoreError::not_found(ResourceKind::Note, name.as_str()));
            }
            Ok(())
        })
    }

    fn delete_note(&self, project_id: &str, note_id: &str) -> StoreResult<()> {
        let name = format_note(project_id, note_id);
        self.write_tx(|tx| delete_row(tx, ResourceKind::Note, "notes", &name))
    }

    fn list_notes(&self, project_id: &str, request: &ListRequest) -> StoreResult<Page<Note>> {
        self.list_bodies(
            "SELECT name, body
             FROM notes
             WHERE project_id = ?1 AND name > ?2
             ORDER BY name ASC;",
            project_id,
            request,
        )
    }

    fn create_occurrence(&self, occurrence: &Occurrence) -> StoreResult<()> {
        occurrence.validate()?;
        let project_id = project_id_of(ResourceKind::Occurrence, &occurrence.name)?;
        let body = encode_body(occurrence)?;
        self.write_tx(|tx| {
            if row_exists(tx, "occurrences", &occurrence.name)? {
                return Err(StoreError::already_exists(
                    ResourceKind::Occurrence,
                    occurrence.name.as_str(),
                ));
            }
            if !row_exists(tx, "notes", &occurrence.note_name)? {
                return Err(StoreError::not_found(
                    ResourceKind::Note,
                    occurrence.note_name.as_str(),
                ));
            }
            tx.execute(
                "INSERT INTO occurrences (name, project_id, note_name, body)
                 VALUES (?1, ?2, ?3, ?4);",
                params![occurrence.name, project_id, occurrence.note_name, body],
            )?;
            Ok(())
        })
    }

    fn get_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<Occurrence> {
        self.get_body("occurrences", &format_occurrence(project_id, occurrence_id))
    }

    fn update_occurrence(
        &self,
        project_id: &str,
        occurrence_id: &str,
        occurrence: &Occurrence,
    ) -> StoreResult<()> {
        let name = format_occurrence(project_id, occurrence_id);
        check_replacement(&name, occurrence)?;
        let body = encode_body(occurrence)?;
        self.write_tx(|tx| {
            let previous_note: Option<String> = tx
                .query_row(
                    "SELECT note_name FROM occurrences WHERE name = ?1;",
                    [&name],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(previous_note) = previous_note else {
                return Err(StoreError::not_found(
                    ResourceKind::Occurrence,
                    name.as_str(),
                ));
            };
            if previous_note != occurrence.note_name
                && !row_exists(tx, "notes", &occurrence.note_name)?
            {
                return Err(StoreError::not_found(
                    ResourceKind::Note,
                    occurrence.note_name.as_str(),
                ));
            }
            tx.execute(
                "UPDATE occurrences
                 SET note_name = ?2,
                     body = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE name = ?1;",
                params![name, occurrence.note_name, body],
            )?;
            Ok(())
        })
    }

    fn delete_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<()> {
        let name = format_occurrence(project_id, occurrence_id);
        self.write_tx(|tx| delete_row(tx, ResourceKind::Occurrence, "occurrences", &name))
    }

    fn list_occurrences(
        &self,
        project_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Occurrence>> {
        self.list_bodies(
            "SELECT name, body
             FROM occurrences
             WHERE project_id = ?1 AND name > ?2
             ORDER BY name ASC;",
            project_id,
            request,
        )
    }

    fn get_note_by_occurrence(&self, project_id: &str, occurrence_id: &str) -> StoreResult<Note> {
        let occurrence: Occurrence =
            self.get_body("occurrences", &format_occurrence(project_id, occurrence_id))?;
        self.get_body("notes", &occurrence.note_name)
    }

    fn list_note_occurrences(
        &self,
        project_id: &str,
        note_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Occurrence>> {
        let note_name = format_note(project_id, note_id);
        self.list_bodies_checked(NOTE_OCCURRENCES_SQL, &note_name, request, |conn| {
            if row_exists(conn, "notes", &note_name)? {
                Ok(())
            } else {
                Err(StoreError::not_found(ResourceKind::Note, note_name.as_str()))
            }
        })
    }

    fn create_operation(&self, operation: &Operation) -> StoreResult<()> {
        operation.validate()?;
        let project_id = project_id_of(ResourceKind::Operation, &operation.name)?;
        let body = encode_body(operation)?;
        self.write_tx(|tx| {
            if row_exists(tx, "operations", &operation.name)? {
                return Err(StoreError::already_exists(
                    ResourceKind::Operation,
                    operation.name.as_str(),
                ));
            }
            tx.execute(
                "INSERT INTO operations (name, project_id, done, body) VALUES (?1, ?2, ?3, ?4);",
                params![operation.name, project_id, operation.done, body],
            )?;
            Ok(())
        })
    }

    fn get_operation(&self, project_id: &str, operation_id: &str) -> StoreResult<Operation> {
        self.get_body("operations", &format_operation(project_id, operation_id))
    }

    fn update_operation(
        &self,
        project_id: &str,
        operation_id: &str,
        operation: &Operation,
    ) -> StoreResult<()> {
        let name = format_operation(project_id, operation_id);
        check_replacement(&name, operation)?;
        let body = encode_body(operation)?;
        self.write_tx(|tx| {
            let changed = tx.execute(
                "UPDATE operations
                 SET done = ?2,
                     body = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE name = ?1;",
                params![name, operation.done, body],
            )?;
            if changed == 0 {
                return Err(StoreError::not_found(
                    ResourceKind::Operation,
                    name.as_str(),
                ));
            }
            Ok(())
        })
    }

    fn delete_operation(&self, project_id: &str, operation_id: &str) -> StoreResult<()> {
        let name = format_operation(project_id, operation_id);
        self.write_tx(|tx| delete_row(tx, ResourceKind::Operation, "operations", &name))
    }

    fn list_operations(
        &self,
        project_id: &str,
        request: &ListRequest,
    ) -> StoreResult<Page<Operation>> {
        self.list_bodies(
            "SELECT name, body
             FROM operations
             WHERE project_id = ?1 AND name > ?2
             ORDER BY name ASC;",
            project_id,
            request,
        )
    }
}

fn encode_body<T: Resource>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|err| {
        StoreError::InvalidData(format!("failed to encode {} body: {err}", T::KIND))
    })
}

fn decode_body<T: Resource>(name: &str, body: &str) -> StoreResult<T> {
    let value: T = serde_json::from_str(body).map_err(|err| {
        StoreError::InvalidData(format!("invalid {} body for `{name}`: {err}", T::KIND))
    })?;
    if value.name() != name {
        return Err(StoreError::InvalidData(format!(
            "{} body names `{}` but is stored under `{name}`",
            T::KIND,
            value.name()
        )));
    }
    Ok(value)
}

fn decode_row<T: Resource>(row: &Row<'_>) -> StoreResult<T> {
    let name: String = row.get("name")?;
    let body: String = row.get("body")?;
    decode_body(&name, &body)
}

fn load_body<T: Resource>(
    conn: &Connection,
    table: &'static str,
    name: &str,
) -> StoreResult<Option<T>> {
    let body: Option<String> = conn
        .query_row(
            &format!("SELECT body FROM {table} WHERE name = ?1;"),
            [name],
            |row| row.get(0),
        )
        .optional()?;
    body.map(|body| decode_body(name, &body)).transpose()
}

fn row_exists(conn: &Connection, table: &'static str, name: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE name = ?1);"),
        [name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn delete_row(
    tx: &Transaction<'_>,
    kind: ResourceKind,
    table: &'static str,
    name: &str,
) -> StoreResult<()> {
    let changed = tx.execute(&format!("DELETE FROM {table} WHERE name = ?1;"), [name])?;
    if changed == 0 {
        return Err(StoreError::not_found(kind, name));
    }
    Ok(())
}
