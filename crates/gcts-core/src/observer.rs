//! Checkpoint hooks for rollback and test-run progress.
//!
//! The orchestrators report their progress to an injected [`GctsObserver`]
//! instead of logging directly. [`TracingObserver`] turns each checkpoint into
//! a structured `tracing` event:
//!
//! - `rollback.strategy_selected`
//! - `rollback.commit_status`
//! - `rollback.commit_resolved`
//! - `aunit.package_started`
//! - `aunit.method_result`
//! - `aunit.package_finished`

use tracing::{error, info};

use crate::aunit::result::{MethodOutcome, PackageVerdict};
use crate::rollback::RollbackStrategy;

/// Receives progress checkpoints. Every method defaults to a no-op.
pub trait GctsObserver: Send + Sync {
    fn strategy_selected(&self, _repository: &str, _strategy: RollbackStrategy) {}

    fn commit_status_observed(&self, _commit: &str, _state: &str) {}

    fn commit_resolved(&self, _repository: &str, _commit: &str, _strategy: RollbackStrategy) {}

    fn package_started(&self, _package: &str) {}

    fn method_result(&self, _package: &str, _outcome: &MethodOutcome) {}

    fn package_finished(&self, _verdict: &PackageVerdict) {}
}

/// Ignores every checkpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl GctsObserver for NoopObserver {}

/// Emits every checkpoint as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl GctsObserver for TracingObserver {
    fn strategy_selected(&self, repository: &str, strategy: RollbackStrategy) {
        info!(event = "rollback.strategy_selected", repository = %repository, strategy = %strategy);
    }

    fn commit_status_observed(&self, commit: &str, state: &str) {
        info!(event = "rollback.commit_status", commit = %commit, state = %state);
    }

    fn commit_resolved(&self, repository: &str, commit: &str, strategy: RollbackStrategy) {
        info!(
            event = "rollback.commit_resolved",
            repository = %repository,
            commit = %commit,
            strategy = %strategy,
        );
    }

    fn package_started(&self, package: &str) {
        info!(event = "aunit.package_started", package = %package);
    }

    fn method_result(&self, package: &str, outcome: &MethodOutcome) {
        if outcome.passed() {
            info!(
                event = "aunit.method_result",
                package = %package,
                program = %outcome.program,
                class = %outcome.class,
                method = %outcome.method,
                "{} - ok",
                outcome.method
            );
        } else {
            error!(
                event = "aunit.method_result",
                package = %package,
                program = %outcome.program,
                class = %outcome.class,
                method = %outcome.method,
                alerts = ?outcome.alerts,
                "{} - error",
                outcome.method
            );
        }
    }

    fn package_finished(&self, verdict: &PackageVerdict) {
        info!(
            event = "aunit.package_finished",
            package = %verdict.package,
            methods = verdict.methods.len(),
            failed = verdict.failed_methods(),
            passed = verdict.passed(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_observer_without_subscriber() {
        // No global subscriber is installed; emitting must not panic.
        let observer = TracingObserver;
        observer.strategy_selected("repo", RollbackStrategy::History);
        observer.method_result(
            "ZPKG",
            &MethodOutcome {
                program: "ZCL_A".to_string(),
                class: "LTCL_A".to_string(),
                method: "RUN".to_string(),
                alerts: vec!["Assertion failed".to_string()],
            },
        );
        observer.package_finished(&PackageVerdict::default());
    }
}
