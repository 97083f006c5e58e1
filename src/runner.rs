// SPDX-License-Identifier: PMPL-1.0-or-later
//! Check registry and audit runner.
//!
//! Checks run one at a time against a single shared session, in the order
//! they were registered. Every registered check contributes exactly one
//! result to the report.

use crate::checks::Check;
use crate::config::RunnerConfig;
use crate::error::{PrivacyError, Result};
use crate::inspect::{PageInspector, SessionProvider};
use crate::model::Report;
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Ordered set of checks plus the timing policy used to run them
pub struct CheckRegistry {
    checks: Vec<Box<dyn Check>>,
    settle: Duration,
    pacing: Duration,
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("checks", &self.check_ids())
            .field("settle", &self.settle)
            .field("pacing", &self.pacing)
            .finish()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

impl CheckRegistry {
    /// An empty registry with no settle or pacing delay
    pub fn new() -> Self {
        Self::with_timing(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_timing(settle: Duration, pacing: Duration) -> Self {
        Self {
            checks: Vec::new(),
            settle,
            pacing,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::with_timing(config.settle_delay(), config.pacing_delay())
    }

    /// Add a check. Ids must be unique within the registry.
    pub fn register(&mut self, check: Box<dyn Check>) -> Result<()> {
        if self.checks.iter().any(|c| c.id() == check.id()) {
            return Err(PrivacyError::DuplicateCheck(check.id().to_string()));
        }
        self.checks.push(check);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn checks(&self) -> &[Box<dyn Check>] {
        &self.checks
    }

    pub fn check_ids(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.id()).collect()
    }

    /// Run every check against `url` on an already acquired session
    pub fn run(&self, session: &mut dyn PageInspector, url: &str) -> Report {
        let mut report = Report::new(url);
        info!("Running {} checks against {}", self.checks.len(), url);

        for (i, check) in self.checks.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                thread::sleep(self.pacing);
            }
            let result = check.execute(session, url, self.settle);
            info!("{}: {}", check.id(), result.status);
            report.add_result(result);
        }

        let summary = report.summary();
        info!(
            "Audit complete: {} passed, {} failed, {} errors",
            summary.passed, summary.failed, summary.errors
        );
        report
    }

    /// Acquire a session, run every check, and release the session.
    ///
    /// Failing to acquire the session returns `SessionUnavailable` and no
    /// report. The session is always released; release errors are logged.
    pub fn audit<P: SessionProvider>(&self, provider: &P, url: &str) -> Result<Report> {
        let mut session = provider.acquire().map_err(|e| match e {
            PrivacyError::SessionUnavailable(_) => e,
            other => PrivacyError::SessionUnavailable(other.to_string()),
        })?;

        let mut guard = SessionGuard(session);
        Ok(self.run(&mut guard.0, url))
    }
}

/// Closes the session when dropped, on unwind as well as on return
struct SessionGuard<S: PageInspector>(S);

impl<S: PageInspector> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if let Err(e) = self.0.close() {
            warn!("Failed to release inspection session: {}", e);
        }
    }
}
