//! Network simulation: artificial latency on every routed request and a
//! small injected failure rate on mutating ones.
//!
//! `AppState` holds an `Arc<dyn FaultInjector>`. Production uses
//! `RandomFaults`; tests swap in `NoFaults` or the scripted `FailNext`.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

#[async_trait]
pub trait FaultInjector: Send + Sync {
    /// Suspends the current request for the simulated round-trip time.
    async fn delay(&self);

    /// Rolls for a transient server failure. Only consulted for mutating requests.
    fn should_fail(&self) -> bool;
}

/// Uniform latency in `latency_ms` and failures with probability `failure_rate`.
pub struct RandomFaults {
    latency_ms: RangeInclusive<u64>,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl RandomFaults {
    /// `seed` makes the latency and failure sequence reproducible.
    pub fn new(latency_ms: RangeInclusive<u64>, failure_rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        RandomFaults {
            latency_ms,
            failure_rate,
            rng: Mutex::new(rng),
        }
    }

    fn sample_latency(&self) -> Duration {
        if self.latency_ms.is_empty() {
            return Duration::ZERO;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Duration::from_millis(rng.random_range(self.latency_ms.clone()))
    }
}

#[async_trait]
impl FaultInjector for RandomFaults {
    async fn delay(&self) {
        let latency = self.sample_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn should_fail(&self) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random::<f64>() < self.failure_rate
    }
}

/// No latency, no failures.
pub struct NoFaults;

#[async_trait]
impl FaultInjector for NoFaults {
    async fn delay(&self) {}

    fn should_fail(&self) -> bool {
        false
    }
}

/// Fails the next `n` mutating requests, then behaves like `NoFaults`.
#[derive(Default)]
pub struct FailNext {
    remaining: AtomicUsize,
}

impl FailNext {
    pub fn new(n: usize) -> Self {
        FailNext {
            remaining: AtomicUsize::new(n),
        }
    }

    pub fn arm(&self, n: usize) {
        self.remaining.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl FaultInjector for FailNext {
    async fn delay(&self) {}

    fn should_fail(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Middleware: delay every request, then fail mutating ones before the handler
/// (and therefore the store) is reached.
pub async fn simulate_network(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.faults.delay().await;
    if req.method() != Method::GET && state.faults.should_fail() {
        warn!(
            method = %req.method(),
            path = %req.uri().path(),
            "Injecting simulated server failure"
        );
        return Err(AppError::SimulatedFailure);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_rate_is_calibrated() {
        let faults = RandomFaults::new(0..=0, 0.02, Some(2024));
        let failures = (0..10_000).filter(|_| faults.should_fail()).count();
        // Binomial(10_000, 0.02): mean 200, sd 14. Allow roughly four sd either way.
        assert!(
            (140..=260).contains(&failures),
            "observed {failures} failures"
        );
    }

    #[test]
    fn test_zero_and_full_rates() {
        let never = RandomFaults::new(0..=0, 0.0, Some(1));
        assert!((0..1_000).all(|_| !never.should_fail()));
        let always = RandomFaults::new(0..=0, 1.0, Some(1));
        assert!((0..1_000).all(|_| always.should_fail()));
    }

    #[test]
    fn test_latency_stays_in_range() {
        let faults = RandomFaults::new(50..=200, 0.0, Some(9));
        for _ in 0..500 {
            let latency = faults.sample_latency();
            assert!(latency >= Duration::from_millis(50));
            assert!(latency <= Duration::from_millis(200));
        }
    }

    #[test]
    fn test_fail_next_counts_down() {
        let faults = FailNext::new(2);
        assert!(faults.should_fail());
        assert!(faults.should_fail());
        assert!(!faults.should_fail());
        faults.arm(1);
        assert!(faults.should_fail());
        assert!(!faults.should_fail());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_sleeps_for_sampled_latency() {
        let faults = RandomFaults::new(100..=100, 0.0, Some(5));
        let started = tokio::time::Instant::now();
        faults.delay().await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(110));
    }
}
