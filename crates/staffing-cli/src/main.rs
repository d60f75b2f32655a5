//! `staffing`: command-line front end for the staffing engine.
//!
//! Reads `staffing.toml` (or the path given with `--config`), opens the SQLite
//! store and runs one command, printing the result as JSON.
//!
//! # Usage
//!
//! ```text
//! staffing seed reference.json
//! staffing assign --worker <id> --position <id> --shift <id> --start 2025-01-01
//! staffing alerts --severity critical
//! staffing rest-days --from 2025-01-01 --to 2025-01-31 --today 2025-01-01
//! ```

mod config;
mod seed;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use staffing_core::{
  assignment::{AssignmentFilter, AssignmentStatus, NewAssignment},
  attendance::{AttendanceInput, BulkEntry},
  coverage::{AlertFilter, AlertType, Severity},
  engine::{AssignmentEngine, AttendanceEngine, AvailabilityService, CoverageAlerts},
  settings::Clock,
};
use staffing_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::AppConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "staffing", version, about = "Staffing assignments, coverage and attendance")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "staffing.toml")]
  config: PathBuf,

  /// Pin "today" instead of reading the system clock.
  #[arg(long, global = true, value_name = "DATE")]
  today: Option<NaiveDate>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Load workers, projects, positions and shifts from a JSON file.
  Seed { file: PathBuf },

  /// Create an assignment.
  Assign {
    #[command(flatten)]
    placement: Placement,
    /// Accept unmet requirements and record them as warnings.
    #[arg(long)]
    force:     bool,
  },

  /// Check a placement without writing it.
  Validate {
    #[command(flatten)]
    placement: Placement,
  },

  /// List assignments.
  Assignments {
    #[arg(long)]
    worker:   Option<Uuid>,
    #[arg(long)]
    project:  Option<Uuid>,
    #[arg(long)]
    position: Option<Uuid>,
    #[arg(long)]
    status:   Option<AssignmentStatus>,
  },

  Finish {
    assignment: Uuid,
    #[arg(long)]
    reason:     Option<String>,
  },

  Suspend {
    assignment: Uuid,
    #[arg(long)]
    reason:     String,
  },

  Reactivate { assignment: Uuid },

  /// Delete an assignment that has no attendance.
  Delete { assignment: Uuid },

  /// Record attendance for one day.
  Attendance {
    assignment:  Uuid,
    #[arg(long)]
    date:        NaiveDate,
    #[arg(long)]
    entry:       Option<NaiveTime>,
    #[arg(long)]
    exit:        Option<NaiveTime>,
    /// Record a rest day; entry and exit are ignored.
    #[arg(long)]
    rest:        bool,
    /// Worker covering the shift.
    #[arg(long, requires = "reason")]
    replaced_by: Option<Uuid>,
    #[arg(long)]
    reason:      Option<String>,
    #[arg(long)]
    notes:       Option<String>,
  },

  /// Record a JSON array of attendance entries, all or nothing.
  Bulk { file: PathBuf },

  /// Generate rest days for rotating shifts.
  RestDays {
    #[arg(long)]
    from: NaiveDate,
    #[arg(long)]
    to:   NaiveDate,
  },

  /// Attendance totals and records of one worker.
  History {
    worker: Uuid,
    #[arg(long)]
    from:   NaiveDate,
    #[arg(long)]
    to:     NaiveDate,
  },

  /// Workers free over a range.
  Available {
    #[arg(long)]
    from:     NaiveDate,
    #[arg(long)]
    to:       Option<NaiveDate>,
    /// Only workers meeting this position's requirements.
    #[arg(long)]
    position: Option<Uuid>,
  },

  /// Day-by-day availability of one worker.
  Calendar {
    worker: Uuid,
    #[arg(long)]
    from:   NaiveDate,
    #[arg(long)]
    to:     NaiveDate,
  },

  /// Coverage of a project's active positions.
  Coverage { project: Uuid },

  /// Short-staffed or expiring positions.
  Alerts {
    #[arg(long)]
    project:  Option<Uuid>,
    #[arg(long)]
    date:     Option<NaiveDate>,
    #[arg(long)]
    severity: Option<Severity>,
    #[arg(long = "type")]
    kind:     Option<AlertType>,
  },
}

/// Fields shared by `assign` and `validate`.
#[derive(Args)]
struct Placement {
  #[arg(long)]
  worker:   Uuid,
  #[arg(long)]
  project:  Option<Uuid>,
  #[arg(long)]
  position: Option<Uuid>,
  #[arg(long)]
  shift:    Uuid,
  #[arg(long)]
  start:    NaiveDate,
  #[arg(long)]
  end:      Option<NaiveDate>,
  #[arg(long)]
  notes:    Option<String>,
}

impl From<Placement> for NewAssignment {
  fn from(p: Placement) -> Self {
    Self {
      worker_id:   p.worker,
      project_id:  p.project,
      position_id: p.position,
      shift_id:    p.shift,
      start_date:  p.start,
      end_date:    p.end,
      notes:       p.notes,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = AppConfig::load(&cli.config)?;

  let clock = cli.today.map_or(Clock::System, Clock::Fixed);
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?
    .with_settings(cfg.engine)
    .with_clock(clock);

  run(&store, cli.command).await
}

async fn run(store: &SqliteStore, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Seed { file } => {
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading seed file {}", file.display()))?;
      let seed = serde_json::from_str(&raw).context("parsing seed file")?;
      print(&seed::apply(store, seed).await?)
    }
    Command::Assign { placement, force } => {
      let input = NewAssignment::from(placement);
      let created = if force {
        store.create_with_override(input).await?
      } else {
        store.create(input).await?
      };
      print(&created)
    }
    Command::Validate { placement } => print(&store.validate(placement.into()).await?),
    Command::Assignments { worker, project, position, status } => {
      let filter = AssignmentFilter { worker_id: worker, project_id: project, position_id: position, status };
      print(&store.list_assignments(filter).await?)
    }
    Command::Finish { assignment, reason } => print(&store.finish(assignment, reason).await?),
    Command::Suspend { assignment, reason } => print(&store.suspend(assignment, reason).await?),
    Command::Reactivate { assignment } => print(&store.reactivate(assignment).await?),
    Command::Delete { assignment } => {
      store.delete(assignment).await?;
      print(&serde_json::json!({ "deleted": assignment }))
    }
    Command::Attendance { assignment, date, entry, exit, rest, replaced_by, reason, notes } => {
      let input = AttendanceInput {
        entry_time: entry,
        exit_time: exit,
        is_rest_day: rest,
        was_replaced: replaced_by.is_some(),
        replacement_worker_id: replaced_by,
        replacement_reason: reason,
        notes,
      };
      print(&store.record(assignment, date, input, None).await?)
    }
    Command::Bulk { file } => {
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading batch file {}", file.display()))?;
      let entries: Vec<BulkEntry> = serde_json::from_str(&raw).context("parsing batch file")?;
      print(&store.bulk_record(entries, None).await?)
    }
    Command::RestDays { from, to } => print(&store.generate_rest_days(from, to).await?),
    Command::History { worker, from, to } => print(&store.history_for_worker(worker, from, to).await?),
    Command::Available { from, to, position } => {
      print(&store.list_available_workers(from, to, position).await?)
    }
    Command::Calendar { worker, from, to } => print(&store.calendar(worker, from, to).await?),
    Command::Coverage { project } => print(&store.project_coverage_stats(project).await?),
    Command::Alerts { project, date, severity, kind } => {
      let filter = AlertFilter { project_id: project, date, severity, kind };
      print(&store.list_alerts(filter).await?)
    }
  }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
