//! Configuration for the session core

use std::time::Duration;

use crate::error::{Result, SessionError};

/// Backoff policy for automatic profile fetch retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the second attempt
    pub initial_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,

    /// Growth factor applied per failed attempt
    pub multiplier: u32,

    /// Automatic attempts per resolution, first attempt included
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `failures` consecutive failed attempts (1-based)
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1);
        let factor = self.multiplier.saturating_pow(exponent);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Whether another automatic attempt is allowed after `failures` failures
    pub fn allows_retry(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }
}

/// Session core configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long `Resolving` may last before a manual retry is offered
    pub resolve_timeout: Duration,

    /// Automatic retry policy for failed profile fetches
    pub retry: RetryPolicy,

    /// Capacity of the actor's command mailbox
    pub mailbox_capacity: usize,
}

/// Built-in defaults; ignores the environment
impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resolve_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
            mailbox_capacity: 256,
        }
    }
}

impl SessionConfig {
    /// Create config with sensible defaults, honoring environment overrides
    ///
    /// | Variable                      | Default |
    /// |-------------------------------|---------|
    /// | `OBRAMO_RESOLVE_TIMEOUT_SECS` | 15      |
    /// | `OBRAMO_RETRY_INITIAL_MS`     | 1000    |
    /// | `OBRAMO_RETRY_MAX_MS`         | 30000   |
    /// | `OBRAMO_RETRY_MAX_ATTEMPTS`   | 5       |
    pub fn new() -> Self {
        let defaults = Self::default();
        Self {
            resolve_timeout: Duration::from_secs(env_or(
                "OBRAMO_RESOLVE_TIMEOUT_SECS",
                defaults.resolve_timeout.as_secs(),
            )),
            retry: RetryPolicy {
                initial_delay: Duration::from_millis(env_or(
                    "OBRAMO_RETRY_INITIAL_MS",
                    defaults.retry.initial_delay.as_millis() as u64,
                )),
                max_delay: Duration::from_millis(env_or(
                    "OBRAMO_RETRY_MAX_MS",
                    defaults.retry.max_delay.as_millis() as u64,
                )),
                max_attempts: env_or("OBRAMO_RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts),
                ..defaults.retry
            },
            ..defaults
        }
    }

    /// Override the resolving timeout
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    /// Override the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the mailbox capacity
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Reject values the actor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.mailbox_capacity == 0 {
            return Err(SessionError::Config("mailbox_capacity must be > 0".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(SessionError::Config("retry.max_attempts must be > 0".into()));
        }
        if self.retry.multiplier == 0 {
            return Err(SessionError::Config("retry.multiplier must be > 0".into()));
        }
        if self.retry.initial_delay > self.retry.max_delay {
            return Err(SessionError::Config(
                "retry.initial_delay exceeds retry.max_delay".into(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
