use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Circuit breaker type guarding the backup mirror.
pub type BackupBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Breaker for the backup webhook.
///
/// Opens after 5 consecutive mirror failures and waits 30s, doubling up to
/// 5min, before letting a trial request through. While open, callers get
/// `failsafe::Error::Rejected` without touching the network.
pub fn create_backup_circuit_breaker() -> BackupBreaker {
    let backoff = backoff::exponential(Duration::from_secs(30), Duration::from_secs(300));
    let policy = failure_policy::consecutive_failures(5, backoff);

    Config::new().failure_policy(policy).build()
}
