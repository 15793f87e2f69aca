//! Per-provider circuit breakers.
//!
//! Process-local liveness state: a plain mutex-guarded map keyed by
//! provider name. Not durable on purpose; it resets naturally on restart
//! and after the cool-down window.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Breaker tuning knobs.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures that open the breaker
    pub failure_threshold: u32,
    /// How long an open breaker short-circuits calls
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Failure tracking for every upstream provider.
///
/// Safe for concurrent use from multiple in-flight requests.
#[derive(Debug)]
pub struct BreakerRegistry {
    config: BreakerConfig,
    states: Mutex<HashMap<String, BreakerState>>,
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Whether calls to `provider` should be short-circuited right now.
    ///
    /// An open breaker whose cool-down has elapsed reports closed, letting
    /// the next call through as a trial; a failed trial re-opens it with a
    /// fresh cool-down.
    pub fn is_open(&self, provider: &str) -> bool {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        match states.get(provider).and_then(|s| s.opened_at) {
            Some(opened_at) => opened_at.elapsed() < self.config.cooldown,
            None => false,
        }
    }

    /// Record a failed call; opens the breaker at the threshold.
    pub fn record_failure(&self, provider: &str) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        let state = states.entry(provider.to_string()).or_default();
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.config.failure_threshold {
            if state.opened_at.is_none() {
                tracing::warn!(
                    provider,
                    failures = state.consecutive_failures,
                    "circuit breaker opened"
                );
            }
            state.opened_at = Some(Instant::now());
        }
    }

    /// Record a successful call; closes the breaker and zeroes the count.
    pub fn record_success(&self, provider: &str) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = states.get_mut(provider) {
            if state.opened_at.is_some() {
                tracing::info!(provider, "circuit breaker closed after success");
            }
            state.consecutive_failures = 0;
            state.opened_at = None;
        }
    }

    /// Current consecutive failure count, for observability and tests.
    pub fn failure_count(&self, provider: &str) -> u32 {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states
            .get(provider)
            .map(|s| s.consecutive_failures)
            .unwrap_or(0)
    }
}
