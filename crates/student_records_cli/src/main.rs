//! Command-line entry point over the student records gateways.
//!
//! # Responsibility
//! - Open a store from flags or a JSON config file.
//! - Invoke one gateway operation per run and print the result as JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use std::path::PathBuf;
use student_records_core::{
    core_version, default_log_level, init_logging, ping, FieldMap, LoggingConfig,
    MajorAssignment, MajorGateway, NewMajor, NewStudent, RecordGateway, Store, StoreConfig,
    StudentGateway,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Student records store", long_about = None)]
struct Args {
    /// SQLite database file. Defaults to a throwaway in-memory store.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON store config; `--db` and `--allow-unassigned` override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files. Logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Accept students without a major.
    #[arg(long, global = true)]
    allow_unassigned: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print crate health and version.
    Ping,
    /// List every major.
    Majors,
    AddMajor {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List students with their major names.
    Students {
        #[arg(long)]
        major_id: Option<i64>,
        #[arg(long)]
        course: Option<i64>,
    },
    /// Show one student with its major name.
    Student { id: i64 },
    AddStudent {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        enrollment_year: i32,
        #[arg(long)]
        course: i32,
        #[arg(long)]
        major_id: Option<i64>,
        #[arg(long)]
        notes: Option<String>,
    },
    DeleteStudent { id: i64 },
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(log_dir) = args.log_dir.as_ref() {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        let mut logging = LoggingConfig::new(level, log_dir);
        logging.duplicate_to_stderr = true;
        init_logging(&logging).map_err(anyhow::Error::msg)?;
    }

    let store = Store::open(store_config(&args)?).context("failed to open store")?;
    info!(
        "event=cli_run module=cli status=start command={:?}",
        args.command
    );
    run(args.command, &store)
}

fn run(command: Command, store: &Store) -> Result<()> {
    match command {
        Command::Ping => print_json(&json!({ "ping": ping(), "version": core_version() })),
        Command::Majors => print_json(&MajorGateway::new(store).find_all()?),
        Command::AddMajor { name, description } => {
            let mut input = NewMajor::new(name);
            input.major_description = description;
            print_json(&MajorGateway::new(store).add(&FieldMap::from(&input))?)
        }
        Command::Students { major_id, course } => {
            let mut filter = FieldMap::new();
            if let Some(major_id) = major_id {
                filter.insert("major_id", major_id);
            }
            if let Some(course) = course {
                filter.insert("course", course);
            }
            print_json(&StudentGateway::new(store).find_students(&filter)?)
        }
        Command::Student { id } => match StudentGateway::new(store).find_full_data(id)? {
            Some(projection) => print_json(&projection),
            None => bail!("student {id} not found"),
        },
        Command::AddStudent {
            first_name,
            last_name,
            email,
            enrollment_year,
            course,
            major_id,
            notes,
        } => {
            let mut input =
                NewStudent::new(first_name, last_name, email).enrolled(enrollment_year, course);
            input.major_id = major_id;
            input.special_notes = notes;
            let id = StudentGateway::new(store).add_student(&FieldMap::from(&input))?;
            print_json(&json!({ "id": id }))
        }
        Command::DeleteStudent { id } => {
            match StudentGateway::new(store).delete_student_by_id(id)? {
                Some(id) => print_json(&json!({ "deleted": id })),
                None => bail!("student {id} not found"),
            }
        }
    }
}

fn store_config(args: &Args) -> Result<StoreConfig> {
    let mut config = match args.config.as_ref() {
        Some(path) => StoreConfig::from_json_file(path)?,
        None => StoreConfig::default(),
    };
    if let Some(db) = args.db.as_ref() {
        config.db_path = Some(db.clone());
    }
    if args.allow_unassigned {
        config.major_assignment = MajorAssignment::Optional;
    }
    Ok(config)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
