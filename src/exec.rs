// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Executor glue: serialize, send, drain, scan.
//!
//! The connection is owned by the caller; this crate neither opens nor
//! pools connections. All I/O is confined to the [`Connection`] calls —
//! building, serializing and scanning are pure and freely concurrent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ast::value::Value;
use crate::dialect::Dialect;
use crate::error::Error;
use crate::scan::{scan_one, scan_rows, RowSet, Shape};
use crate::serialize::Statement;

/// Errors crossing the driver boundary.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The driver seam. An adapter wraps a concrete driver connection and maps
/// its row and parameter types to [`Value`]. `query` drains the full result
/// before returning — the scanner consumes a collected row set, not a
/// stream.
pub trait Connection {
    fn query(
        &mut self,
        sql: &str,
        args: &[Value],
        cancel: &CancelToken,
    ) -> Result<RowSet, DriverError>;

    fn execute(
        &mut self,
        sql: &str,
        args: &[Value],
        cancel: &CancelToken,
    ) -> Result<u64, DriverError>;
}

/// External cancellation for one statement: a shared flag plus an optional
/// deadline. Cloning shares the flag, so a token can be cancelled from
/// another thread. Drivers should poll [`CancelToken::is_cancelled`] while
/// draining rows.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that never cancels.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancelled: Arc::default(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    /// Surfaces cancellation as the error the executor returns.
    pub fn check(&self) -> Result<(), Error> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(Error::Cancelled("statement cancelled".to_string()));
        }
        if matches!(self.deadline, Some(deadline) if Instant::now() >= deadline) {
            return Err(Error::Cancelled("deadline exceeded".to_string()));
        }
        Ok(())
    }
}

fn truncated(sql: &str) -> String {
    const MAX: usize = 120;
    if sql.len() <= MAX {
        return sql.to_string();
    }
    let mut end = MAX;
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end])
}

fn driver_failure(operation: &str, sql: &str, cancel: &CancelToken, source: DriverError) -> Error {
    // A driver abort caused by our own token reports as cancellation, not
    // as a driver failure.
    if cancel.is_cancelled() {
        return match cancel.check() {
            Err(err) => err,
            Ok(()) => Error::Cancelled("statement cancelled".to_string()),
        };
    }
    Error::Execution {
        context: format!("{} failed: {}", operation, truncated(sql)),
        source,
    }
}

/// Query and exec entry points, available on every statement kind.
pub trait Execute: Statement {
    /// Serializes the statement, runs it, drains the rows and scans them
    /// into destination values.
    fn query<D: Shape, C: Connection>(
        &self,
        dialect: &Dialect,
        conn: &mut C,
    ) -> Result<Vec<D>, Error> {
        self.query_with(dialect, conn, &CancelToken::none())
    }

    /// Cancellation-aware variant. Partial results are discarded when the
    /// token fires.
    fn query_with<D: Shape, C: Connection>(
        &self,
        dialect: &Dialect,
        conn: &mut C,
        cancel: &CancelToken,
    ) -> Result<Vec<D>, Error> {
        let rows = self.fetch(dialect, conn, cancel)?;
        scan_rows(&rows)
    }

    /// Like [`Execute::query`], for a single-record destination.
    fn query_one<D: Shape, C: Connection>(
        &self,
        dialect: &Dialect,
        conn: &mut C,
    ) -> Result<D, Error> {
        let rows = self.fetch(dialect, conn, &CancelToken::none())?;
        scan_one(&rows)
    }

    /// Runs the statement for its side effect, returning the driver's
    /// affected-row count.
    fn exec<C: Connection>(&self, dialect: &Dialect, conn: &mut C) -> Result<u64, Error> {
        self.exec_with(dialect, conn, &CancelToken::none())
    }

    fn exec_with<C: Connection>(
        &self,
        dialect: &Dialect,
        conn: &mut C,
        cancel: &CancelToken,
    ) -> Result<u64, Error> {
        let (sql, args) = self.sql(dialect)?;
        log::debug!(target: "sqlbuild", "exec: {} [{} args]", sql, args.len());
        cancel.check()?;
        conn.execute(&sql, &args, cancel)
            .map_err(|source| driver_failure("exec", &sql, cancel, source))
    }

    #[doc(hidden)]
    fn fetch<C: Connection>(
        &self,
        dialect: &Dialect,
        conn: &mut C,
        cancel: &CancelToken,
    ) -> Result<RowSet, Error> {
        let (sql, args) = self.sql(dialect)?;
        log::debug!(target: "sqlbuild", "query: {} [{} args]", sql, args.len());
        cancel.check()?;
        let rows = conn
            .query(&sql, &args, cancel)
            .map_err(|source| driver_failure("query", &sql, cancel, source))?;
        cancel.check()?;
        Ok(rows)
    }
}

impl<S: Statement + ?Sized> Execute for S {}
