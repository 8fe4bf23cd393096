//! Server-driven rate limiting
//!
//! Every endpoint owns one token bucket. The bucket size, the tokens left and
//! the moment it refills all come from the `X-Ratelimit-*` headers of the
//! endpoint's responses. Until the first response carrying those headers the
//! limiter lets every request through.
//!
//! Callers that find the bucket empty queue up in arrival order. When the
//! reset fires (a Tokio task sleeping until the server-supplied deadline) the
//! bucket is refilled and queued callers are handed tokens oldest first.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Header carrying the bucket size
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Header carrying the tokens left in the current window
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header carrying the Unix timestamp (seconds) of the next refill
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Rate limit values reported by a single response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitHeaders {
    /// Bucket size
    pub limit: u32,
    /// Tokens left
    pub remaining: u32,
    /// When the bucket refills, if the server said
    pub reset: Option<DateTime<Utc>>,
}

impl RateLimitHeaders {
    /// Parse the rate limit headers of a response.
    ///
    /// Returns `None` when `X-Ratelimit-Limit` is absent, or when the limit or
    /// remaining count cannot be read as integers.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let raw_limit = header_str(headers, LIMIT_HEADER)?;

        let Some(limit) = parse_count(raw_limit) else {
            warn!(value = raw_limit, "Ignoring malformed {LIMIT_HEADER} header");
            return None;
        };

        let raw_remaining = header_str(headers, REMAINING_HEADER).unwrap_or_default();
        let Some(remaining) = parse_count(raw_remaining) else {
            warn!(
                value = raw_remaining,
                "Ignoring rate limit headers with malformed {REMAINING_HEADER}"
            );
            return None;
        };

        let reset = header_str(headers, RESET_HEADER).and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!(value = raw, "Ignoring malformed {RESET_HEADER} header");
            }
            parsed
        });

        Some(Self {
            limit,
            remaining,
            reset,
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

/// Integer count, negative values clamp to zero
fn parse_count(value: &str) -> Option<u32> {
    let n: i64 = value.parse().ok()?;
    Some(u32::try_from(n.max(0)).unwrap_or(u32::MAX))
}

/// Unix timestamp in seconds, fractional part allowed
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let secs: f64 = value.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((secs * 1000.0) as i64)
}

/// Time left until `reset`, zero when it already passed
fn delay_until(reset: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (reset - now).to_std().unwrap_or(Duration::ZERO)
}

#[derive(Debug, Default)]
struct State {
    limit: Option<u32>,
    remaining: u32,
    waiters: VecDeque<oneshot::Sender<()>>,
    reset_task: Option<JoinHandle<()>>,
}

impl State {
    fn reset_pending(&self) -> bool {
        self.reset_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Hand tokens to queued callers, oldest first.
    ///
    /// Callers that gave up waiting are dropped from the queue without
    /// consuming a token.
    fn release_waiters(&mut self) -> usize {
        let mut released = 0;
        while self.remaining > 0 {
            let Some(waiter) = self.waiters.pop_front() else {
                break;
            };
            if waiter.send(()).is_ok() {
                self.remaining -= 1;
                released += 1;
            }
        }
        released
    }
}

/// A caller parked in the queue.
///
/// Dropped before completion, it leaves the queue. A token that was already
/// handed to it goes back into the bucket for the next waiter.
struct QueuedAcquire<'a> {
    inner: &'a Inner,
    rx: oneshot::Receiver<()>,
    done: bool,
}

impl QueuedAcquire<'_> {
    async fn wait(&mut self) {
        let _ = (&mut self.rx).await;
        self.done = true;
    }
}

impl Drop for QueuedAcquire<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.rx.close();

        let mut state = self.inner.lock();
        if self.rx.try_recv().is_ok() {
            if let Some(limit) = state.limit {
                state.remaining = (state.remaining + 1).min(limit);
            }
            let released = state.release_waiters();
            debug!(
                endpoint = %self.inner.label,
                released,
                "Cancelled waiter returned its token"
            );
        }
        state.waiters.retain(|tx| !tx.is_closed());
    }
}

#[derive(Debug)]
struct Inner {
    label: String,
    state: Mutex<State>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset(&self) {
        let mut state = self.lock();
        state.reset_task = None;

        let Some(limit) = state.limit else {
            return;
        };
        state.remaining = limit;
        let released = state.release_waiters();

        debug!(
            endpoint = %self.label,
            limit,
            released,
            still_queued = state.waiters.len(),
            "Rate limit reset"
        );
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = state.reset_task.take() {
            task.abort();
        }
    }
}

/// Per-endpoint token bucket calibrated from response headers.
///
/// Cloning yields another handle to the same bucket.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    /// Create an unthrottled limiter; `label` names it in log output
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                label: label.into(),
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Wait for a token and consume it.
    ///
    /// Returns immediately while no limit has been observed. Otherwise, if
    /// the bucket is empty, the caller joins the back of the queue and
    /// resumes once a reset (or a response reporting fresh tokens) hands it
    /// a token. Dropping the returned future leaves the queue at once; a
    /// token handed over before the drop is passed on to the next waiter.
    pub async fn acquire(&self) {
        let mut waiter = {
            let mut state = self.inner.lock();

            if state.limit.is_none() {
                debug!(endpoint = %self.inner.label, "No rate limit observed, skipping acquire");
                return;
            }

            if state.remaining > 0 {
                state.remaining -= 1;
                return;
            }

            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            debug!(
                endpoint = %self.inner.label,
                queued = state.waiters.len(),
                "Bucket empty, waiting for reset"
            );
            QueuedAcquire {
                inner: &*self.inner,
                rx,
                done: false,
            }
        };

        // The releaser already took our token out of the bucket.
        waiter.wait().await;
    }

    /// Recalibrate from the headers of a completed response.
    ///
    /// Responses without rate limit headers leave the limiter untouched.
    /// Must be called from within a Tokio runtime, since the first
    /// observation of a window schedules the reset task.
    pub fn observe(&self, headers: &HeaderMap) {
        match RateLimitHeaders::from_headers(headers) {
            Some(values) => self.update(values),
            None => debug!(endpoint = %self.inner.label, "No rate limit headers"),
        }
    }

    /// Apply already parsed rate limit values
    pub fn update(&self, values: RateLimitHeaders) {
        self.update_at(values, Utc::now());
    }

    fn update_at(&self, values: RateLimitHeaders, now: DateTime<Utc>) {
        let mut state = self.inner.lock();

        // The server is authoritative, even when it lowers the count.
        state.limit = Some(values.limit);
        state.remaining = values.remaining;

        if !state.waiters.is_empty() {
            let released = state.release_waiters();
            if released > 0 {
                debug!(endpoint = %self.inner.label, released, "Released waiters on fresh tokens");
            }
        }

        // An armed reset is kept even if this response names another instant.
        if state.reset_pending() {
            debug!(endpoint = %self.inner.label, "Rate limit reset already scheduled");
            return;
        }

        let Some(reset) = values.reset else {
            warn!(
                endpoint = %self.inner.label,
                "Rate limit headers without a reset time, bucket will not refill on its own"
            );
            return;
        };

        let delay = delay_until(reset, now);
        debug!(
            endpoint = %self.inner.label,
            delay_ms = delay.as_millis() as u64,
            "Scheduling rate limit reset"
        );
        state.reset_task = Some(self.schedule_reset(delay));
    }

    fn schedule_reset(&self, delay: Duration) -> JoinHandle<()> {
        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                inner.reset();
            }
        })
    }

    /// Bucket size, `None` until the first rate limit headers arrive
    pub fn limit(&self) -> Option<u32> {
        self.inner.lock().limit
    }

    /// Tokens left in the current window
    pub fn remaining(&self) -> u32 {
        self.inner.lock().remaining
    }

    /// Number of callers waiting for a token
    pub fn queued(&self) -> usize {
        self.inner.lock().waiters.len()
    }

    /// Whether a reset is scheduled
    pub fn reset_pending(&self) -> bool {
        self.inner.lock().reset_pending()
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use chrono::TimeDelta;
    use reqwest::header::{HeaderName, HeaderValue};
    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready};

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    fn values(limit: u32, remaining: u32, reset_in: i64, now: DateTime<Utc>) -> RateLimitHeaders {
        RateLimitHeaders {
            limit,
            remaining,
            reset: Some(now + TimeDelta::seconds(reset_in)),
        }
    }

    #[test]
    fn test_parse_headers_case_insensitive() {
        let map = headers(&[
            ("X-Ratelimit-Limit", "60"),
            ("X-RateLimit-Remaining", "59"),
            ("x-ratelimit-reset", "1700000000"),
        ]);

        let parsed = RateLimitHeaders::from_headers(&map).unwrap();
        assert_eq!(parsed.limit, 60);
        assert_eq!(parsed.remaining, 59);
        assert_eq!(parsed.reset.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_parse_headers_absent_limit() {
        let map = headers(&[("X-Ratelimit-Remaining", "5")]);
        assert!(RateLimitHeaders::from_headers(&map).is_none());
        assert!(RateLimitHeaders::from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_parse_headers_malformed() {
        let map = headers(&[("X-Ratelimit-Limit", "lots"), ("X-Ratelimit-Remaining", "1")]);
        assert!(RateLimitHeaders::from_headers(&map).is_none());

        let map = headers(&[("X-Ratelimit-Limit", "10")]);
        assert!(RateLimitHeaders::from_headers(&map).is_none());
    }

    #[test]
    fn test_parse_headers_fractional_reset_and_negative_remaining() {
        let map = headers(&[
            ("X-Ratelimit-Limit", "10"),
            ("X-Ratelimit-Remaining", "-3"),
            ("X-Ratelimit-Reset", "1700000000.5"),
        ]);

        let parsed = RateLimitHeaders::from_headers(&map).unwrap();
        assert_eq!(parsed.remaining, 0);
        assert_eq!(parsed.reset.unwrap().timestamp_millis(), 1_700_000_000_500);
    }

    #[test]
    fn test_delay_until_past_is_zero() {
        let now = Utc::now();
        assert_eq!(delay_until(now - TimeDelta::seconds(5), now), Duration::ZERO);
        assert_eq!(
            delay_until(now + TimeDelta::seconds(5), now),
            Duration::from_secs(5)
        );
    }

    #[tokio::test]
    async fn test_unthrottled_until_observed() {
        let limiter = RateLimiter::new("GET /v1/test");

        for _ in 0..100 {
            limiter.acquire().await;
        }

        assert_eq!(limiter.limit(), None);
        assert_eq!(limiter.remaining(), 0);
        assert!(!limiter.reset_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_without_headers_changes_nothing() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();
        limiter.update_at(values(5, 3, 60, now), now);

        limiter.observe(&headers(&[("Content-Type", "application/json")]));

        assert_eq!(limiter.limit(), Some(5));
        assert_eq!(limiter.remaining(), 3);
        assert!(limiter.reset_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_overwrites_counts() {
        let limiter = RateLimiter::new("GET /v1/test");
        let reset = (Utc::now() + TimeDelta::seconds(3600)).timestamp().to_string();
        limiter.observe(&headers(&[
            ("X-Ratelimit-Limit", "10"),
            ("X-Ratelimit-Remaining", "7"),
            ("X-Ratelimit-Reset", &reset),
        ]));
        assert_eq!(limiter.limit(), Some(10));
        assert_eq!(limiter.remaining(), 7);

        limiter.observe(&headers(&[
            ("X-Ratelimit-Limit", "10"),
            ("X-Ratelimit-Remaining", "0"),
            ("X-Ratelimit-Reset", &reset),
        ]));
        assert_eq!(limiter.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_observe_keeps_first_reset() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();

        limiter.update_at(values(3, 0, 60, now), now);
        assert!(limiter.reset_pending());

        // An earlier reset instant does not re-arm the timer
        limiter.update_at(values(3, 0, 10, now), now);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(limiter.remaining(), 0);
        assert!(limiter.reset_pending());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(limiter.remaining(), 3);
        assert!(!limiter.reset_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_reset_fires_immediately() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();

        limiter.update_at(values(4, 0, -30, now), now);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(limiter.remaining(), 4);
        assert!(!limiter.reset_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_at_most_limit_tokens_before_reset() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();
        limiter.update_at(values(3, 3, 3600, now), now);

        let mut calls: Vec<_> = (0..5).map(|_| task::spawn(limiter.acquire())).collect();
        let mut granted = 0;
        for call in &mut calls {
            if call.poll().is_ready() {
                granted += 1;
            }
        }

        assert_eq!(granted, 3);
        assert_eq!(limiter.remaining(), 0);
        assert_eq!(limiter.queued(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_caller_waits_for_reset() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();
        limiter.update_at(values(2, 2, 60, now), now);

        let mut first = task::spawn(limiter.acquire());
        let mut second = task::spawn(limiter.acquire());
        let mut third = task::spawn(limiter.acquire());

        assert_ready!(first.poll());
        assert_ready!(second.poll());
        assert_pending!(third.poll());

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(third.is_woken());
        assert_ready!(third.poll());
        assert_eq!(limiter.remaining(), 1);
        assert_eq!(limiter.queued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_tokens_release_waiter() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();
        limiter.update_at(values(2, 0, 3600, now), now);

        let mut waiting = task::spawn(limiter.acquire());
        assert_pending!(waiting.poll());

        limiter.update_at(values(2, 1, 3600, now), now);

        assert_ready!(waiting.poll());
        assert_eq!(limiter.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_releases_waiters_in_order() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();
        limiter.update_at(values(2, 0, 3600, now), now);

        let mut a = task::spawn(limiter.acquire());
        let mut b = task::spawn(limiter.acquire());
        let mut c = task::spawn(limiter.acquire());
        assert_pending!(a.poll());
        assert_pending!(b.poll());
        assert_pending!(c.poll());
        assert_eq!(limiter.queued(), 3);

        limiter.inner.reset();

        assert_ready!(a.poll());
        assert_ready!(b.poll());
        assert_pending!(c.poll());
        assert_eq!(limiter.queued(), 1);
        assert_eq!(limiter.remaining(), 0);

        // A newcomer cannot overtake the caller still queued
        let mut late = task::spawn(limiter.acquire());
        assert_pending!(late.poll());

        limiter.inner.reset();

        assert_ready!(c.poll());
        assert_ready!(late.poll());
        assert_eq!(limiter.queued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waiter_does_not_consume_token() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();
        limiter.update_at(values(1, 0, 3600, now), now);

        let mut gone = task::spawn(limiter.acquire());
        assert_pending!(gone.poll());
        let mut kept = task::spawn(limiter.acquire());
        assert_pending!(kept.poll());
        drop(gone);

        limiter.inner.reset();

        assert_ready!(kept.poll());
        assert_eq!(limiter.remaining(), 0);
        assert_eq!(limiter.queued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_dropped_after_release_returns_token() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();
        limiter.update_at(values(1, 0, 3600, now), now);

        let mut first = task::spawn(limiter.acquire());
        assert_pending!(first.poll());
        let mut second = task::spawn(limiter.acquire());
        assert_pending!(second.poll());

        // The token is handed to `first`, which goes away before running
        limiter.inner.reset();
        assert_eq!(limiter.queued(), 1);
        drop(first);

        assert!(second.is_woken());
        assert_ready!(second.poll());
        assert_eq!(limiter.remaining(), 0);
        assert_eq!(limiter.queued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returned_token_goes_back_to_bucket() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();
        limiter.update_at(values(2, 0, 3600, now), now);

        let mut only = task::spawn(limiter.acquire());
        assert_pending!(only.poll());

        limiter.update_at(values(2, 1, 3600, now), now);
        assert_eq!(limiter.remaining(), 0);
        drop(only);

        assert_eq!(limiter.remaining(), 1);
        assert_eq!(limiter.queued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_waiters_do_not_pile_up() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();
        limiter.update(RateLimitHeaders {
            limit: 1,
            remaining: 0,
            reset: None,
        });
        assert!(!limiter.reset_pending());

        for _ in 0..10 {
            let timed_out =
                tokio::time::timeout(Duration::from_millis(10), limiter.acquire()).await;
            assert!(timed_out.is_err());
        }
        assert_eq!(limiter.queued(), 0);

        let mut waiting = task::spawn(limiter.acquire());
        assert_pending!(waiting.poll());
        assert_eq!(limiter.queued(), 1);

        limiter.update_at(values(1, 1, 3600, now), now);
        assert_ready!(waiting.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_rearms_on_next_observation() {
        let limiter = RateLimiter::new("GET /v1/test");
        let now = Utc::now();

        limiter.update_at(values(5, 1, 10, now), now);
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!limiter.reset_pending());

        limiter.update_at(values(5, 4, 10, now), now);
        assert!(limiter.reset_pending());
    }
}
