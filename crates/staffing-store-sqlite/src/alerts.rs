//! [`CoverageAlerts`] impl.

use staffing_core::{
  assignment::Assignment,
  coverage::{AlertFilter, AlertType, CoverageAlert, classify, expiring_within},
  engine::CoverageAlerts,
};

use crate::{Error, Result, SqliteStore, queries};

impl CoverageAlerts for SqliteStore {
  type Error = Error;

  async fn list_alerts(&self, filter: AlertFilter) -> Result<Vec<CoverageAlert>> {
    self
      .read(move |conn, ctx| {
        let date = filter.date.unwrap_or(ctx.today);
        let mut projects = queries::active_projects(conn)?;
        if let Some(project_id) = filter.project_id {
          queries::require_project(conn, project_id)?;
          projects.retain(|p| p.project_id == project_id);
        }

        let mut alerts = Vec::new();
        for project in &projects {
          for position in queries::positions_of(conn, project.project_id, true)? {
            let holders = queries::active_assignments_of_position(conn, position.position_id)?;
            let covering: Vec<&Assignment> = holders.iter().filter(|a| a.range().contains(date)).collect();
            let assigned = covering.len() as u32;
            let expiring = expiring_within(&covering, date, ctx.settings.expiry_window_days);
            let (kind, severity) = classify(position.headcount, assigned, expiring);
            if kind == AlertType::FullCoverage {
              continue;
            }

            let alert = CoverageAlert {
              project_id: project.project_id,
              project_name: project.name.clone(),
              position_id: position.position_id,
              message: CoverageAlert::message_for(kind, &position.name, position.headcount, assigned, expiring),
              position_name: position.name,
              required: position.headcount,
              assigned,
              shortfall: position.headcount.saturating_sub(assigned),
              expiring,
              kind,
              severity,
            };
            if filter.accepts(&alert) {
              alerts.push(alert);
            }
          }
        }

        alerts.sort_by(|a, b| {
          a.severity
            .cmp(&b.severity)
            .then_with(|| a.project_name.cmp(&b.project_name))
            .then_with(|| a.position_name.cmp(&b.position_name))
        });
        Ok(alerts)
      })
      .await
  }
}
