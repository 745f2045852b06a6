//! Command-line front end for the product parameter manager.
//!
//! Provides commands for:
//! - Login, users and pages
//! - Column editing and record CRUD
//! - CSV/JSON import and export
//! - Backup and restore

mod cli;

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use clap::Parser;
use param_core::auth::{Role, Session};
use param_core::backup::backup_file_name;
use param_core::coercion::coerce;
use param_core::config::AppConfig;
use param_core::export::export_file_name;
use param_core::record::{filter_records, Record, RecordFilter};
use param_core::schema::{move_column, remove_column, Column, Direction, Page};
use param_core::storage::FileStore;
use param_core::tabular::FileFormat;
use param_core::Database;
use tracing_subscriber::EnvFilter;

use cli::{Cli, ColumnsCommand, Commands, Format, Move, PageCommand, RecordsCommand, UserCommand};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    let store = FileStore::open(&config)
        .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;
    let db = Database::new(Arc::new(store));
    if db.ensure_default_admin(&config)? {
        tracing::info!("No users found, default administrator created");
    }

    run(&cli, &config, &db)
}

fn run(cli: &Cli, config: &AppConfig, db: &Database) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init => {
            println!("Data directory ready at {}", config.data_dir.display());
        }
        Commands::Login { username, password } => {
            let session = db.login(username, password)?;
            println!("Logged in as {} ({:?})", session.user().username, session.user().role);
        }
        Commands::Logout => {
            db.logout()?;
            println!("Logged out");
        }
        Commands::User(command) => run_user(cli, db, command)?,
        Commands::Page(command) => run_page(cli, db, command)?,
        Commands::Columns(command) => run_columns(cli, db, command)?,
        Commands::Records(command) => run_records(cli, db, command)?,
        Commands::Import { page, file } => {
            let session = session(cli, db)?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("invalid file name {}", file.display()))?;
            let reader = File::open(file).with_context(|| format!("opening {}", file.display()))?;
            let report = db.import_file(&session, page, name, reader)?;
            for m in &report.mapping {
                println!("  {} -> {} ({:?})", m.header, m.column_key, m.kind);
            }
            println!("Imported {} records", report.imported);
        }
        Commands::Export {
            page,
            format,
            ids,
            out,
        } => {
            let format = match format {
                Format::Csv => FileFormat::Csv,
                Format::Json => FileFormat::Json,
            };
            let target = db.page(page)?;
            let selected = (!ids.is_empty()).then_some(ids.as_slice());
            let text = db.export_page(page, format, selected)?;
            let name = export_file_name(
                &target.name,
                format,
                selected.is_some(),
                Utc::now().timestamp_millis(),
            );
            write_output(out, &name, &text)?;
        }
        Commands::Backup { out } => {
            let snapshot = db.export_backup(config)?;
            write_output(out, &backup_file_name(Utc::now()), &snapshot.to_json()?)?;
        }
        Commands::Restore { file } => {
            let session = session(cli, db)?;
            let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
            let info = db.restore_backup(&session, &text)?;
            println!(
                "Restored backup version {} from {}: {} pages, {} users. Log in again.",
                info.version, info.export_time, info.page_count, info.user_count
            );
        }
    }
    Ok(())
}

/// Session from --user/--password, else the stored current user.
fn session(cli: &Cli, db: &Database) -> anyhow::Result<Session> {
    match (&cli.user, &cli.password) {
        (Some(user), Some(password)) => Ok(db.login(user, password)?),
        (Some(_), None) | (None, Some(_)) => bail!("--user and --password must be given together"),
        (None, None) => db
            .current_session()?
            .ok_or_else(|| anyhow!("not logged in; run `param-tool login` or pass --user/--password")),
    }
}

fn run_user(cli: &Cli, db: &Database, command: &UserCommand) -> anyhow::Result<()> {
    match command {
        UserCommand::Add {
            username,
            password,
            admin,
        } => {
            session(cli, db)?.require_admin("add user")?;
            let role = if *admin { Role::Admin } else { Role::User };
            let user = db.create_user(username, password, role)?;
            println!("Created user {} ({})", user.username, user.id);
        }
        UserCommand::List => {
            for user in db.users()? {
                println!("{}\t{}\t{:?}", user.id, user.username, user.role);
            }
        }
    }
    Ok(())
}

fn run_page(cli: &Cli, db: &Database, command: &PageCommand) -> anyhow::Result<()> {
    match command {
        PageCommand::Create { name } => {
            let page = db.create_page(&session(cli, db)?, name)?;
            println!("Created page {} ({})", page.name, page.id);
        }
        PageCommand::List => {
            for page in db.pages()? {
                println!("{}\t{}\t{} columns", page.id, page.name, page.columns.len());
            }
        }
        PageCommand::Rename { page, name } => {
            let page = db.rename_page(&session(cli, db)?, page, name)?;
            println!("Renamed page {} to {}", page.id, page.name);
        }
        PageCommand::Delete { page } => {
            db.delete_page(&session(cli, db)?, page)?;
            println!("Deleted page {}", page);
        }
    }
    Ok(())
}

fn run_columns(cli: &Cli, db: &Database, command: &ColumnsCommand) -> anyhow::Result<()> {
    let page_id = match command {
        ColumnsCommand::Show { page } => {
            print_columns(&db.page(page)?);
            return Ok(());
        }
        ColumnsCommand::Set { page, .. }
        | ColumnsCommand::Add { page }
        | ColumnsCommand::Move { page, .. }
        | ColumnsCommand::Remove { page, .. } => page,
    };

    let session = session(cli, db)?;
    let mut columns = db.page(page_id)?.columns;
    match command {
        ColumnsCommand::Show { .. } => {}
        ColumnsCommand::Set { file, .. } => {
            let text =
                fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
            columns = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a column list", file.display()))?;
        }
        ColumnsCommand::Add { .. } => {
            columns.push(Column::new_default(Utc::now().timestamp_millis()));
        }
        ColumnsCommand::Move {
            index, direction, ..
        } => {
            let direction = match direction {
                Move::Up => Direction::Up,
                Move::Down => Direction::Down,
            };
            move_column(&mut columns, *index, direction);
        }
        ColumnsCommand::Remove { index, .. } => {
            remove_column(&mut columns, *index)
                .ok_or_else(|| anyhow!("no column at index {}", index))?;
        }
    }

    let page = db.update_columns(&session, page_id, columns)?;
    print_columns(&page);
    Ok(())
}

fn print_columns(page: &Page) {
    println!("{} ({})", page.name, page.id);
    for (i, column) in page.columns.iter().enumerate() {
        println!(
            "  {}\t{}\t{}\t{}\t{}",
            i,
            column.key,
            column.label,
            column.column_type.as_str(),
            column.options
        );
    }
}

fn run_records(cli: &Cli, db: &Database, command: &RecordsCommand) -> anyhow::Result<()> {
    match command {
        RecordsCommand::List {
            page,
            filter,
            limit,
            offset,
        } => {
            let target = db.page(page)?;
            let records = db.records(page)?;
            let mut query = RecordFilter::default();
            for item in filter {
                let (key, text) = split_assignment(item)?;
                query = query.contains(key, text);
            }
            query.limit = *limit;
            query.offset = *offset;

            let headers: Vec<&str> = target.columns.iter().map(Column::header).collect();
            println!("id\t{}", headers.join("\t"));
            for record in filter_records(&records, &query) {
                let cells: Vec<String> = target
                    .columns
                    .iter()
                    .map(|c| match record.get(&c.key) {
                        Some(value) => value.display(c.column_type),
                        None => "-".to_string(),
                    })
                    .collect();
                println!("{}\t{}", record.id, cells.join("\t"));
            }
        }
        RecordsCommand::Add { page, fields } => {
            let session = session(cli, db)?;
            let target = db.page(page)?;
            let mut record = db.new_record(page)?;
            apply_fields(&mut record, &target, fields)?;
            let id = record.id.clone();
            db.save_record(&session, page, record)?;
            println!("Added record {}", id);
        }
        RecordsCommand::Set { page, id, fields } => {
            let session = session(cli, db)?;
            let target = db.page(page)?;
            let mut record = db
                .records(page)?
                .into_iter()
                .find(|r| &r.id == id)
                .ok_or_else(|| anyhow!("no record {} in page {}", id, page))?;
            apply_fields(&mut record, &target, fields)?;
            db.save_record(&session, page, record)?;
            println!("Updated record {}", id);
        }
        RecordsCommand::Delete { page, id } => {
            db.delete_record(&session(cli, db)?, page, id)?;
            println!("Deleted record {}", id);
        }
    }
    Ok(())
}

/// Sets `key=value` pairs, coercing each value to its column's type.
fn apply_fields(record: &mut Record, page: &Page, fields: &[String]) -> anyhow::Result<()> {
    for item in fields {
        let (key, text) = split_assignment(item)?;
        let column = page
            .column(key)
            .ok_or_else(|| anyhow!("page {} has no column '{}'", page.id, key))?;
        let raw = serde_json::Value::String(text.to_string());
        record.set(key, coerce(Some(&raw), column.column_type));
    }
    Ok(())
}

fn split_assignment(item: &str) -> anyhow::Result<(&str, &str)> {
    item.split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", item))
}

fn write_output(dir: &Path, name: &str, text: &str) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(name);
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
