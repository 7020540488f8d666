use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use recordkeeper::models::{Book, Day, Schedule, Task, Urgency};
use recordkeeper::stats::{BookStats, ScheduleStats, TaskStats};
use recordkeeper::{
    BackendKind, Command, Config, Controller, FormSchema, IdStrategy, Outcome, RawFields, Record, RecordStore,
    StatusFilter,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

#[derive(Parser)]
#[command(name = "recordkeeper")]
#[command(about = "RecordKeeper CLI - Tasks, class schedules and books kept on local storage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the config file (default: <config dir>/recordkeeper/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the collections (overrides the config file)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend: file, sqlite or memory
    #[arg(short, long, global = true)]
    backend: Option<BackendKind>,

    /// Id generation: timestamp or uuid
    #[arg(long, global = true)]
    ids: Option<IdStrategy>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    collection: Collection,
}

#[derive(Subcommand)]
enum Collection {
    /// Assignments with deadlines (fields: name, subject, deadline, description)
    Tasks {
        #[command(subcommand)]
        action: Action,
    },

    /// Weekly class timetable (fields: course_name, lecturer, day, time, room, duration)
    Schedules {
        #[command(subcommand)]
        action: Action,
    },

    /// Personal book catalog (fields: title, author, status)
    Books {
        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Subcommand)]
enum Action {
    /// Create a record from field=value pairs
    Add {
        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Change fields of a record; unspecified fields keep their value
    Edit {
        id: String,
        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Delete a record
    Delete {
        id: String,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },

    /// Flip a boolean field of a record
    Toggle {
        id: String,
        #[arg(default_value = "completed")]
        field: String,
    },

    /// List records
    List {
        /// Status to show, or "all"
        #[arg(short, long, default_value = "all")]
        status: String,

        /// Case-insensitive text to look for
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Sort key
        #[arg(long)]
        sort: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show aggregate counts
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Show a single record
    Show { id: String },
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected field=value, got '{}'", s)),
    }
}

/// Per-collection rendering for the terminal
trait Listing: FormSchema {
    fn row(&self, now: NaiveDateTime) -> String;

    fn stats(records: &[Self], now: NaiveDateTime) -> Result<serde_json::Value>;

    fn footer(records: &[Self], _now: NaiveDateTime) -> String {
        format!("{} record(s)", records.len())
    }
}

impl Listing for Task {
    fn row(&self, now: NaiveDateTime) -> String {
        let check = if self.completed { "[x]" } else { "[ ]" };
        let hint = self.deadline_hint(now).unwrap_or_default();
        let line = format!(
            "{} {}  {} ({})  due {}  {}",
            check,
            self.id.dimmed(),
            self.name,
            self.subject,
            self.deadline.format("%Y-%m-%d %H:%M"),
            hint
        );
        match self.urgency(now) {
            _ if self.completed => line.green().to_string(),
            Urgency::Overdue => line.red().to_string(),
            Urgency::DueSoon => line.yellow().to_string(),
            Urgency::Normal => line,
        }
    }

    fn stats(records: &[Self], _now: NaiveDateTime) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(TaskStats::of(records))?)
    }
}

impl Listing for Schedule {
    fn row(&self, _now: NaiveDateTime) -> String {
        format!(
            "{}  {} {}-{}  {} ({}) @ {}, {} min",
            self.id.dimmed(),
            self.day.to_string().bold(),
            self.time.format("%H:%M"),
            self.end_time().format("%H:%M"),
            self.course_name,
            self.lecturer,
            self.room,
            self.duration
        )
    }

    fn stats(records: &[Self], now: NaiveDateTime) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(ScheduleStats::of(records, Day::of(now)))?)
    }

    fn footer(records: &[Self], now: NaiveDateTime) -> String {
        let stats = ScheduleStats::of(records, Day::of(now));
        format!(
            "{} class(es), {} today\nNow: {}",
            stats.total,
            stats.today,
            Day::clock_label(now)
        )
    }
}

impl Listing for Book {
    fn row(&self, _now: NaiveDateTime) -> String {
        format!(
            "{}  {} by {} [{}]",
            self.id.dimmed(),
            self.title.bold(),
            self.author,
            self.status.label()
        )
    }

    fn stats(records: &[Self], _now: NaiveDateTime) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(BookStats::of(records))?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing; the filter is swapped for the configured level once the
    // config file has been read
    let early_level = cli.log_level.clone().unwrap_or_else(|| Config::default().log_level);
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&early_level)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(ids) = cli.ids {
        config.id_strategy = ids;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    if let Some(level) = configured_level(std::env::var_os("RUST_LOG").is_some(), &early_level, &config) {
        filter_handle
            .reload(EnvFilter::new(level))
            .map_err(|e| eyre!("Failed to apply log level '{}': {}", level, e))?;
    }

    match cli.collection {
        Collection::Tasks { action } => run::<Task>(&config, action),
        Collection::Schedules { action } => run::<Schedule>(&config, action),
        Collection::Books { action } => run::<Book>(&config, action),
    }
}

/// Level to switch to after loading the config; `None` when RUST_LOG rules
/// or the early filter already matches
fn configured_level<'a>(rust_log_set: bool, early_level: &str, config: &'a Config) -> Option<&'a str> {
    if rust_log_set || config.log_level == early_level {
        return None;
    }
    Some(config.log_level.as_str())
}

fn run<R: Listing>(config: &Config, action: Action) -> Result<()> {
    let store = RecordStore::<R, _>::open(config.open_backend()?).with_ids(config.id_generator());
    let mut app = Controller::new(store);
    let now = app.store().clock().now_local();

    match action {
        Action::Add { fields } => {
            let outcome = app.dispatch(Command::Create(fields.into_iter().collect()));
            report(outcome, now)
        }
        Action::Edit { id, fields } => {
            let mut raw: RawFields = match app.dispatch(Command::BeginEdit(id)) {
                Outcome::Editing(prefill) => prefill,
                other => return report(other, now),
            };
            raw.extend(fields);
            let outcome = app.dispatch(Command::Submit(raw));
            report(outcome, now)
        }
        Action::Delete { id, yes } => {
            let outcome = app.dispatch(Command::RequestDelete(id.clone()));
            if !matches!(outcome, Outcome::ConfirmationRequired(_)) {
                return report(outcome, now);
            }
            if !yes {
                app.dispatch(Command::CancelDelete);
                println!("Not deleted; pass --yes to delete '{}'", id);
                return Ok(());
            }
            let outcome = app.dispatch(Command::ConfirmDelete);
            report(outcome, now)
        }
        Action::Toggle { id, field } => {
            let outcome = app.dispatch(Command::ToggleFlag(id, field));
            report(outcome, now)
        }
        Action::List {
            status,
            search,
            sort,
            json,
        } => {
            app.dispatch(Command::Filter(status.parse::<StatusFilter<R::Status>>()?));
            if let Some(term) = search {
                app.dispatch(Command::Search(term));
            }
            if let Some(key) = sort {
                app.dispatch(Command::Sort(key.parse::<R::SortKey>()?));
            }
            let view = app.view();
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
                return Ok(());
            }
            if view.is_empty() {
                println!("{}", "No records".dimmed());
            }
            for record in &view {
                println!("{}", record.row(now));
            }
            println!("{}", R::footer(app.store().list(), now).dimmed());
            Ok(())
        }
        Action::Stats { json } => {
            let stats = R::stats(app.store().list(), now)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            if let serde_json::Value::Object(fields) = stats {
                for (name, value) in fields {
                    println!("{}: {}", name.bold(), value);
                }
            }
            Ok(())
        }
        Action::Show { id } => {
            let record = app
                .store()
                .get(&id)
                .ok_or_else(|| eyre!("record '{}' not found", id))?;
            println!("{}", record.row(now));
            println!("{}", serde_json::to_string_pretty(record)?);
            Ok(())
        }
    }
}

fn report<R: Listing>(outcome: Outcome<R>, now: NaiveDateTime) -> Result<()> {
    if let Some(warning) = outcome.warning() {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
    match outcome {
        Outcome::Created(m) => println!("{} {}", "Created".green().bold(), m.record.row(now)),
        Outcome::Updated(m) => println!("{} {}", "Updated".green().bold(), m.record.row(now)),
        Outcome::Deleted(m) => println!("{} {}", "Deleted".red().bold(), m.record.id()),
        Outcome::Editing(_) | Outcome::ConfirmationRequired(_) | Outcome::ViewChanged => {}
        Outcome::Rejected(errors) => {
            eprintln!("{}", "Invalid input:".red().bold());
            for (field, error) in errors.iter() {
                eprintln!("  {}: {}", field.bold(), error);
            }
            return Err(eyre!("{} field(s) rejected", errors.len()));
        }
        Outcome::NotFound(id) => return Err(eyre!("record '{}' not found in {}", id, R::collection_name())),
        Outcome::Failed(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level() {
        let config = Config {
            log_level: "debug".to_string(),
            ..Config::default()
        };
        assert_eq!(configured_level(false, "warn", &config), Some("debug"));
        assert_eq!(configured_level(true, "warn", &config), None);
        assert_eq!(configured_level(false, "debug", &config), None);
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("title=Clean Code").unwrap(),
            ("title".to_string(), "Clean Code".to_string())
        );
        assert_eq!(parse_field("note=a=b").unwrap().1, "a=b");
        assert!(parse_field("=x").is_err());
        assert!(parse_field("title").is_err());
    }
}
