//! [`SqliteStore`], the SQLite implementation of the staffing engine traits.
//!
//! Each engine operation is one call onto the connection thread. Writes open
//! a `BEGIN IMMEDIATE` transaction so the write lock is held from the first
//! read; reads run in a deferred transaction for a consistent snapshot.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use staffing_core::settings::{Clock, EngineSettings};

use crate::{Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A staffing store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:     tokio_rusqlite::Connection,
  settings: EngineSettings,
  clock:    Clock,
}

/// Per-call values fixed before the transaction starts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ctx {
  pub today:    NaiveDate,
  pub now:      DateTime<Utc>,
  pub settings: EngineSettings,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("staffing schema ready");
    Ok(Self { conn, settings: EngineSettings::default(), clock: Clock::default() })
  }

  pub fn with_settings(mut self, settings: EngineSettings) -> Self {
    self.settings = settings;
    self
  }

  pub fn with_clock(mut self, clock: Clock) -> Self {
    self.clock = clock;
    self
  }

  pub fn settings(&self) -> &EngineSettings { &self.settings }

  /// The engine's notion of today.
  pub fn today(&self) -> NaiveDate { self.clock.today() }

  fn ctx(&self) -> Ctx { Ctx { today: self.today(), now: Utc::now(), settings: self.settings } }

  /// Run `f` inside a `BEGIN IMMEDIATE` transaction, committing on success.
  pub(crate) async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>, &Ctx) -> Result<T> + Send + 'static,
  {
    self.write_or_rollback(move |tx, ctx| Ok((f(tx, ctx)?, true))).await
  }

  /// Like [`Self::write`], but `f` decides whether to keep its work. The
  /// transaction is committed only when `f` returns `(value, true)`.
  pub(crate) async fn write_or_rollback<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>, &Ctx) -> Result<(T, bool)> + Send + 'static,
  {
    let ctx = self.ctx();
    self
      .conn
      .call(move |conn| Ok(in_transaction(conn, TransactionBehavior::Immediate, |tx| f(tx, &ctx))))
      .await?
  }

  /// Run `f` inside a deferred transaction for a consistent snapshot.
  pub(crate) async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection, &Ctx) -> Result<T> + Send + 'static,
  {
    let ctx = self.ctx();
    self
      .conn
      .call(move |conn| {
        Ok(in_transaction(conn, TransactionBehavior::Deferred, |tx| Ok((f(tx, &ctx)?, false))))
      })
      .await?
  }
}

// An uncommitted transaction rolls back when dropped.
fn in_transaction<T>(
  conn: &mut Connection,
  behavior: TransactionBehavior,
  f: impl FnOnce(&Transaction<'_>) -> Result<(T, bool)>,
) -> Result<T> {
  let tx = conn.transaction_with_behavior(behavior)?;
  let (value, commit) = f(&tx)?;
  if commit {
    tx.commit()?;
  } else {
    tx.rollback()?;
  }
  Ok(value)
}
