//! Catalog command-line entry point.
//!
//! # Responsibility
//! - Expose every catalog storage operation as a subcommand.
//! - Print results as pretty JSON on stdout; failures exit non-zero.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use catalog_core::config::LoggingConfig;
use catalog_core::{
    core_version, init_from_config, open_store, ping, CatalogConfig, CatalogService,
    ListRequest, Note, Occurrence, Operation,
};

/// Supply-chain metadata catalog
#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(about = "Inspect and edit a catalog of notes, occurrences and operations", long_about = None)]
struct Cli {
    /// SQLite catalog file; overrides the storage section of --config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Health check
    Ping,
    /// Print the core version
    Version,
    #[command(subcommand)]
    Project(ProjectCommand),
    #[command(subcommand)]
    Note(NoteCommand),
    #[command(subcommand)]
    Occurrence(OccurrenceCommand),
    #[command(subcommand)]
    Operation(OperationCommand),
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value = "")]
    filter: String,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long, default_value = "")]
    page_token: String,
}

impl ListArgs {
    fn request(&self) -> ListRequest {
        ListRequest {
            filter: self.filter.clone(),
            page_token: self.page_token.clone(),
            page_size: self.page_size,
        }
    }
}

#[derive(Args, Debug)]
struct EntityRef {
    project: String,
    id: String,
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    Create { id: String },
    Get { id: String },
    Delete { id: String },
    List(ListArgs),
}

#[derive(Subcommand, Debug)]
enum NoteCommand {
    /// Create a note from a JSON file
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    Get(EntityRef),
    /// Replace a note with the contents of a JSON file
    Update {
        #[command(flatten)]
        target: EntityRef,
        #[arg(long)]
        file: PathBuf,
    },
    Delete(EntityRef),
    List {
        project: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// List occurrences referencing a note
    Occurrences {
        #[command(flatten)]
        target: EntityRef,
        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Subcommand, Debug)]
enum OccurrenceCommand {
    /// Create an occurrence from a JSON file
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    Get(EntityRef),
    /// Replace an occurrence with the contents of a JSON file
    Update {
        #[command(flatten)]
        target: EntityRef,
        #[arg(long)]
        file: PathBuf,
    },
    Delete(EntityRef),
    List {
        project: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Show the note an occurrence references
    Note(EntityRef),
}

#[derive(Subcommand, Debug)]
enum OperationCommand {
    /// Create an operation from a JSON file
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    /// Create a pending operation with a generated id
    Start {
        project: String,
        /// Inline JSON metadata
        #[arg(long)]
        metadata: Option<String>,
    },
    Get(EntityRef),
    Delete(EntityRef),
    List {
        project: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Mark an operation done
    Done {
        #[command(flatten)]
        target: EntityRef,
        /// Inline JSON response; defaults to null
        #[arg(long)]
        response: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Ping => return print_json(&serde_json::json!({ "ping": ping() })),
        Command::Version => {
            return print_json(&serde_json::json!({ "version": core_version() }))
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    start_logging(&cli, &config)?;
    let service = CatalogService::new(open_store(&config)?);
    debug!(
        "event=cli_dispatch module=cli status=ok backend={}",
        service.store().backend_name()
    );

    match cli.command {
        Command::Ping | Command::Version => Ok(()),
        Command::Project(command) => run_project(&service, command),
        Command::Note(command) => run_note(&service, command),
        Command::Occurrence(command) => run_occurrence(&service, command),
        Command::Operation(command) => run_operation(&service, command),
    }
}

fn load_config(cli: &Cli) -> Result<CatalogConfig> {
    let mut config = match &cli.config {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::default(),
    };
    if let Some(db) = &cli.db {
        let listing = config.listing.clone();
        let logging = config.logging.clone();
        config = CatalogConfig {
            listing,
            logging,
            ..CatalogConfig::sqlite(db.clone())
        };
    } else if cli.config.is_none() {
        bail!("either --db or --config is required");
    }
    config.validate()?;
    Ok(config)
}

/// Command-line flags win over the `[logging]` section.
fn logging_config(cli: &Cli, config: &CatalogConfig) -> LoggingConfig {
    let mut logging = config.logging.clone();
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        logging.dir = Some(dir.clone());
    }
    logging
}

fn start_logging(cli: &Cli, config: &CatalogConfig) -> Result<()> {
    init_from_config(&logging_config(cli, config))?;
    Ok(())
}

fn run_project(service: &CatalogService, command: ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::Create { id } => print_json(&service.create_project(&id)?),
        ProjectCommand::Get { id } => print_json(&service.get_project(&id)?),
        ProjectCommand::Delete { id } => {
            service.delete_project(&id)?;
            print_deleted(&id)
        }
        ProjectCommand::List(list) => print_json(&service.list_projects(&list.request())?),
    }
}

fn run_note(service: &CatalogService, command: NoteCommand) -> Result<()> {
    match command {
        NoteCommand::Create { file } => {
            let note: Note = read_json(&file)?;
            service.create_note(&note)?;
            print_json(&note)
        }
        NoteCommand::Get(target) => print_json(&service.get_note(&target.project, &target.id)?),
        NoteCommand::Update { target, file } => {
            let note: Note = read_json(&file)?;
            service.update_note(&target.project, &target.id, &note)?;
            print_json(&note)
        }
        NoteCommand::Delete(target) => {
            service.delete_note(&target.project, &target.id)?;
            print_deleted(&target.id)
        }
        NoteCommand::List { project, list } => {
            print_json(&service.list_notes(&project, &list.request())?)
        }
        NoteCommand::Occurrences { target, list } => print_json(
            &service.list_note_occurrences(&target.project, &target.id, &list.request())?,
        ),
    }
}

fn run_occurrence(service: &CatalogService, command: OccurrenceCommand) -> Result<()> {
    match command {
        OccurrenceCommand::Create { file } => {
            let occurrence: Occurrence = read_json(&file)?;
            service.create_occurrence(&occurrence)?;
            print_json(&occurrence)
        }
        OccurrenceCommand::Get(target) => {
            print_json(&service.get_occurrence(&target.project, &target.id)?)
        }
        OccurrenceCommand::Update { target, file } => {
            let occurrence: Occurrence = read_json(&file)?;
            service.update_occurrence(&target.project, &target.id, &occurrence)?;
            print_json(&occurrence)
        }
        OccurrenceCommand::Delete(target) => {
            service.delete_occurrence(&target.project, &target.id)?;
            print_deleted(&target.id)
        }
        OccurrenceCommand::List { project, list } => {
            print_json(&service.list_occurrences(&project, &list.request())?)
        }
        OccurrenceCommand::Note(target) => {
            print_json(&service.get_note_by_occurrence(&target.project, &target.id)?)
        }
    }
}

fn run_operation(service: &CatalogService, command: OperationCommand) -> Result<()> {
    match command {
        OperationCommand::Create { file } => {
            let operation: Operation = read_json(&file)?;
            service.create_operation(&operation)?;
            print_json(&operation)
        }
        OperationCommand::Start { project, metadata } => {
            let metadata = metadata.as_deref().map(parse_inline_json).transpose()?;
            print_json(&service.start_operation(&project, metadata)?)
        }
        OperationCommand::Get(target) => {
            print_json(&service.get_operation(&target.project, &target.id)?)
        }
        OperationCommand::Delete(target) => {
            service.delete_operation(&target.project, &target.id)?;
            print_deleted(&target.id)
        }
        OperationCommand::List { project, list } => {
            print_json(&service.list_operations(&project, &list.request())?)
        }
        OperationCommand::Done { target, response } => {
            let response = match response.as_deref() {
                Some(raw) => parse_inline_json(raw)?,
                None => serde_json::Value::Null,
            };
            print_json(&service.complete_operation(&target.project, &target.id, response)?)
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("invalid JSON in `{}`", path.display()))
}

fn parse_inline_json(raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).context("invalid inline JSON")
}

fn print_deleted(id: &str) -> Result<()> {
    print_json(&serde_json::json!({ "deleted": id }))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_config, logging_config, Cli};
    use catalog_core::{default_log_level, BackendKind};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn db_flag_selects_sqlite_backend() {
        let cli = Cli::parse_from(["catalog", "--db", "/tmp/catalog.sqlite3", "project", "list"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.storage.backend, BackendKind::Sqlite);
    }

    #[test]
    fn log_flags_override_logging_section() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("catalog.toml");
        std::fs::write(
            &config_path,
            "[logging]\nlevel = \"error\"\ndir = \"/var/log/catalog\"\n",
        )
        .unwrap();
        let config_arg = config_path.display().to_string();

        let cli = Cli::parse_from([
            "catalog",
            "--config",
            config_arg.as_str(),
            "--log-level",
            "warn",
            "--log-dir",
            "/tmp/catalog-logs",
            "project",
            "list",
        ]);
        let logging = logging_config(&cli, &load_config(&cli).unwrap());
        assert_eq!(logging.level, "warn");
        assert_eq!(logging.dir, Some(PathBuf::from("/tmp/catalog-logs")));

        let cli = Cli::parse_from(["catalog", "--config", config_arg.as_str(), "project", "list"]);
        let logging = logging_config(&cli, &load_config(&cli).unwrap());
        assert_eq!(logging.level, "error");
        assert_eq!(logging.dir, Some(PathBuf::from("/var/log/catalog")));
    }

    #[test]
    fn log_flags_absent_leave_file_logging_off() {
        let cli = Cli::parse_from(["catalog", "--db", "/tmp/catalog.sqlite3", "project", "list"]);
        let logging = logging_config(&cli, &load_config(&cli).unwrap());
        assert_eq!(logging.level, default_log_level());
        assert!(logging.dir.is_none());
    }

    #[test]
    fn missing_storage_flags_are_rejected() {
        let cli = Cli::parse_from(["catalog", "project", "get", "p1"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn note_occurrences_parses_positional_and_list_flags() {
        let cli = Cli::parse_from([
            "catalog",
            "--db",
            "/tmp/c.sqlite3",
            "note",
            "occurrences",
            "scanner",
            "CVE-1999-0710",
            "--page-size",
            "5",
        ]);
        assert!(format!("{:?}", cli.command).contains("CVE-1999-0710"));
    }
}
