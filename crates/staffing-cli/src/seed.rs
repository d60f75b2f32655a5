//! Loading reference data from a JSON seed file.
//!
//! Personnel, projects and the shift catalog are owned by other modules; the
//! seed file is how they are mirrored into a local store.

use serde::{Deserialize, Serialize};
use staffing_core::{
  engine::Directory,
  personnel::Worker,
  project::{PositionRequirement, Project},
  shift::Shift,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
  pub shifts:    Vec<Shift>,
  pub projects:  Vec<Project>,
  pub positions: Vec<PositionRequirement>,
  pub workers:   Vec<Worker>,
}

/// How many records of each kind were written.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
  pub shifts:    usize,
  pub projects:  usize,
  pub positions: usize,
  pub workers:   usize,
}

/// Upsert everything in `seed`. Shifts and projects go first since positions
/// reference them.
pub async fn apply<D: Directory>(directory: &D, seed: SeedFile) -> Result<SeedSummary, D::Error> {
  let mut summary = SeedSummary::default();

  for shift in seed.shifts {
    directory.put_shift(shift).await?;
    summary.shifts += 1;
  }
  for project in seed.projects {
    directory.put_project(project).await?;
    summary.projects += 1;
  }
  for position in seed.positions {
    directory.put_position(position).await?;
    summary.positions += 1;
  }
  for worker in seed.workers {
    directory.put_worker(worker).await?;
    summary.workers += 1;
  }

  tracing::info!(
    shifts = summary.shifts,
    projects = summary.projects,
    positions = summary.positions,
    workers = summary.workers,
    "seed applied"
  );
  Ok(summary)
}
