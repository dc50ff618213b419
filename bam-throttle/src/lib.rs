//! Adaptive concurrency limiter (C7): a dynamic semaphore substitute.
//!
//! A fixed-permit `tokio::sync::Semaphore` cannot have its permit count
//! changed while tasks are waiting on it without migrating those waiters.
//! This instead keeps a manual `active` counter behind a [`parking_lot::Mutex`]
//! and a [`tokio::sync::Notify`]: `acquire` loops on the guarded condition
//! rather than consuming a fixed permit, so `limit` can be adjusted at
//! runtime — increased or decreased — without orphaning anyone already
//! waiting.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use bam_util::math::scale_limit;

#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub initial_concurrency: usize,
    pub min_concurrency: usize,
    pub max_concurrency: usize,
    pub adjustment_interval: Duration,
    pub max_latency_samples: usize,
    pub healthy_error_rate: f64,
    pub unhealthy_error_rate: f64,
    pub high_latency_ms: f64,
    pub increase_factor: f64,
    pub decrease_factor: f64,
    pub rate_limit_decrease_factor: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            initial_concurrency: 10,
            min_concurrency: 1,
            max_concurrency: 50,
            adjustment_interval: Duration::from_secs(10),
            max_latency_samples: 100,
            healthy_error_rate: 0.01,
            unhealthy_error_rate: 0.05,
            high_latency_ms: 1000.0,
            increase_factor: 1.2,
            decrease_factor: 0.8,
            rate_limit_decrease_factor: 0.5,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThrottleMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub rate_limit_errors: u64,
    pub avg_latency_ms: f64,
}

impl ThrottleMetrics {
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.failed_requests as f64 / self.total_requests as f64
        }
    }
}

struct State {
    active: usize,
    limit: usize,
    metrics: ThrottleMetrics,
    latencies: VecDeque<f64>,
    last_adjustment: Instant,
}

/// The adaptive throttle itself. Cloning shares the same underlying state
/// (it is an `Arc`-free handle only because callers are expected to wrap it
/// in an `Arc` themselves, matching how the executor shares one throttle
/// across all spawned tasks).
pub struct AdaptiveThrottle {
    config: ThrottleConfig,
    state: Mutex<State>,
    notify: Notify,
}

/// An acquired slot; dropping it releases the slot and wakes one waiter,
/// mirroring the Python implementation's `_release_async` but without the
/// fire-and-forget task spawn — `release` here is synchronous so `Drop` can
/// call it directly.
#[must_use = "dropping this immediately releases the throttle slot"]
pub struct ThrottlePermit<'a> {
    throttle: &'a AdaptiveThrottle,
}

impl Drop for ThrottlePermit<'_> {
    fn drop(&mut self) {
        self.throttle.release();
    }
}

impl AdaptiveThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        info!(
            initial = config.initial_concurrency,
            min = config.min_concurrency,
            max = config.max_concurrency,
            "adaptive throttle initialized"
        );
        let state = State {
            active: 0,
            limit: config.initial_concurrency,
            metrics: ThrottleMetrics::default(),
            latencies: VecDeque::with_capacity(config.max_latency_samples),
            last_adjustment: Instant::now(),
        };
        Self {
            config,
            state: Mutex::new(state),
            notify: Notify::new(),
        }
    }

    pub fn current_limit(&self) -> usize {
        self.state.lock().limit
    }

    pub fn active(&self) -> usize {
        self.state.lock().active
    }

    pub fn metrics(&self) -> ThrottleMetrics {
        self.state.lock().metrics
    }

    /// Waits until `active < limit`, then takes a slot. The `while`
    /// (not `if`) re-check on every wakeup handles both spurious
    /// notifications and a limit that shrank while this task waited.
    pub async fn acquire(&self) -> ThrottlePermit<'_> {
        loop {
            {
                let mut state = self.state.lock();
                if state.active < state.limit {
                    state.active += 1;
                    debug!(active = state.active, limit = state.limit, "acquired throttle slot");
                    return ThrottlePermit { throttle: self };
                }
            }
            self.notify.notified().await;
        }
    }

    fn release(&self) {
        let mut state = self.state.lock();
        if state.active == 0 {
            warn!("attempted to release throttle slot with no tasks active");
            return;
        }
        state.active -= 1;
        debug!(active = state.active, limit = state.limit, "released throttle slot");
        drop(state);
        self.notify.notify_one();
    }

    pub fn record_success_latency(&self, latency_ms: f64) {
        let mut state = self.state.lock();
        state.metrics.total_requests += 1;
        state.metrics.successful_requests += 1;
        if state.latencies.len() >= self.config.max_latency_samples {
            state.latencies.pop_front();
        }
        state.latencies.push_back(latency_ms);
        state.metrics.avg_latency_ms =
            state.latencies.iter().sum::<f64>() / state.latencies.len() as f64;
        self.maybe_adjust(&mut state);
    }

    pub fn record_failure(&self, is_rate_limit: bool) {
        let mut state = self.state.lock();
        state.metrics.total_requests += 1;
        state.metrics.failed_requests += 1;
        if is_rate_limit {
            state.metrics.rate_limit_errors += 1;
            let old = state.limit;
            state.limit = scale_limit(
                state.limit,
                self.config.rate_limit_decrease_factor,
                self.config.min_concurrency,
                self.config.max_concurrency,
            );
            warn!(old, new = state.limit, "rate limited: decreasing concurrency immediately");
        }
        self.maybe_adjust(&mut state);
        drop(state);
        self.notify.notify_one();
    }

    /// Runs at most once per `adjustment_interval`; called with the lock
    /// already held by `record_success_latency`/`record_failure`.
    fn maybe_adjust(&self, state: &mut State) {
        let now = Instant::now();
        if now.duration_since(state.last_adjustment) < self.config.adjustment_interval {
            return;
        }
        state.last_adjustment = now;

        let error_rate = state.metrics.error_rate();
        let healthy = error_rate < self.config.healthy_error_rate
            && state.metrics.avg_latency_ms < self.config.high_latency_ms;
        let unhealthy = error_rate > self.config.unhealthy_error_rate
            || state.metrics.avg_latency_ms > self.config.high_latency_ms;

        let old = state.limit;
        if healthy {
            state.limit = scale_limit(
                state.limit,
                self.config.increase_factor,
                self.config.min_concurrency,
                self.config.max_concurrency,
            );
            if state.limit > old {
                info!(old, new = state.limit, error_rate, "increasing concurrency");
                self.notify.notify_waiters();
            }
        } else if unhealthy {
            state.limit = scale_limit(
                state.limit,
                self.config.decrease_factor,
                self.config.min_concurrency,
                self.config.max_concurrency,
            );
            if state.limit < old {
                info!(old, new = state.limit, error_rate, "decreasing concurrency");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ThrottleConfig {
        ThrottleConfig {
            initial_concurrency: 2,
            min_concurrency: 1,
            max_concurrency: 8,
            adjustment_interval: Duration::ZERO,
            ..ThrottleConfig::default()
        }
    }

    #[tokio::test]
    async fn acquire_blocks_until_release() {
        let throttle = AdaptiveThrottle::new(ThrottleConfig {
            initial_concurrency: 1,
            ..config()
        });
        let first = throttle.acquire().await;
        assert_eq!(throttle.active(), 1);

        let throttle_ref = &throttle;
        let waiter = tokio::spawn(async move {
            let _permit = throttle_ref.acquire().await;
        });

        tokio::task::yield_now().await;
        drop(first);
        waiter.await.unwrap();
        assert_eq!(throttle.active(), 0);
    }

    #[tokio::test]
    async fn healthy_feedback_increases_limit() {
        let throttle = AdaptiveThrottle::new(config());
        for _ in 0..5 {
            throttle.record_success_latency(10.0);
        }
        assert!(throttle.current_limit() > 2);
    }

    #[tokio::test]
    async fn unhealthy_feedback_decreases_limit() {
        let throttle = AdaptiveThrottle::new(ThrottleConfig {
            initial_concurrency: 8,
            ..config()
        });
        for _ in 0..10 {
            throttle.record_failure(false);
        }
        assert!(throttle.current_limit() < 8);
    }

    #[tokio::test]
    async fn rate_limit_failure_applies_immediate_decrease() {
        let throttle = AdaptiveThrottle::new(ThrottleConfig {
            initial_concurrency: 8,
            adjustment_interval: Duration::from_secs(3600),
            ..config()
        });
        throttle.record_failure(true);
        assert_eq!(throttle.current_limit(), 4);
    }

    #[test]
    fn release_without_acquire_warns_but_does_not_panic() {
        let throttle = AdaptiveThrottle::new(config());
        throttle.release();
        assert_eq!(throttle.active(), 0);
    }
}
