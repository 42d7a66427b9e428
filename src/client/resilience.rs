//! Retries and circuit breaking for engine calls.

use super::SearchEngine;
use crate::config::ResilienceConfig;
use crate::indexer::Document;
use crate::models::SearchRequest;
use crate::{Error, Result};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Circuit breaker state machine.
#[derive(Debug)]
enum BreakerState {
    Closed { failures: u32 },
    Open { opened_at: Instant },
    HalfOpen { trial_in_flight: bool },
}

#[derive(Debug)]
struct CircuitBreaker {
    state: BreakerState,
    failure_threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    fn new(config: &ResilienceConfig) -> Self {
        Self {
            state: BreakerState::Closed { failures: 0 },
            failure_threshold: config.breaker_failure_threshold.max(1),
            reset_timeout: Duration::from_millis(config.breaker_reset_timeout_ms),
        }
    }

    fn allow(&mut self) -> bool {
        match self.state {
            BreakerState::Closed { .. } => true,
            BreakerState::Open { opened_at } => {
                if opened_at.elapsed() >= self.reset_timeout {
                    self.state = BreakerState::HalfOpen {
                        trial_in_flight: true,
                    };
                    true
                } else {
                    false
                }
            },
            BreakerState::HalfOpen {
                ref mut trial_in_flight,
            } => {
                if *trial_in_flight {
                    false
                } else {
                    *trial_in_flight = true;
                    true
                }
            },
        }
    }

    const fn on_success(&mut self) {
        self.state = BreakerState::Closed { failures: 0 };
    }

    /// Records a failure; returns true if this trips the breaker open.
    fn on_failure(&mut self) -> bool {
        match self.state {
            BreakerState::Closed { ref mut failures } => {
                *failures += 1;
                if *failures >= self.failure_threshold {
                    self.state = BreakerState::Open {
                        opened_at: Instant::now(),
                    };
                    return true;
                }
            },
            BreakerState::HalfOpen { .. } => {
                self.state = BreakerState::Open {
                    opened_at: Instant::now(),
                };
                return true;
            },
            BreakerState::Open { .. } => {},
        }
        false
    }

    const fn state_value(&self) -> u8 {
        match self.state {
            BreakerState::Closed { .. } => 0,
            BreakerState::Open { .. } => 1,
            BreakerState::HalfOpen { .. } => 2,
        }
    }
}

enum FailureAction {
    Retry(Error),
    Fail(Error),
}

/// Engine wrapper with bounded retries and a circuit breaker.
///
/// Only transient failures ([`Error::is_transient`]) are retried or counted
/// against the breaker; a 4xx answer fails immediately.
pub struct ResilientEngine<E: SearchEngine> {
    inner: E,
    config: ResilienceConfig,
    breaker: Mutex<CircuitBreaker>,
}

impl<E: SearchEngine> ResilientEngine<E> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: E, config: ResilienceConfig) -> Self {
        let breaker = CircuitBreaker::new(&config);
        Self {
            inner,
            config,
            breaker: Mutex::new(breaker),
        }
    }

    /// Returns the wrapped engine.
    #[must_use]
    pub const fn inner(&self) -> &E {
        &self.inner
    }

    fn execute<T, F>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let engine: &'static str = self.inner.name();
        let span = tracing::info_span!(
            "search_engine.request",
            engine = engine,
            operation = operation,
            status = tracing::field::Empty,
            error = tracing::field::Empty
        );
        let _enter = span.enter();

        let mut breaker = self.breaker.lock().unwrap_or_else(PoisonError::into_inner);
        if !breaker.allow() {
            let breaker_state = breaker.state_value();
            drop(breaker);
            Self::record_breaker_state(engine, breaker_state);
            span.record("status", "circuit_open");
            metrics::counter!(
                "search_engine_requests_total",
                "engine" => engine,
                "operation" => operation,
                "status" => "circuit_open"
            )
            .increment(1);
            return Err(Error::EngineUnavailable {
                operation: operation.to_string(),
                cause: "circuit breaker open".to_string(),
            });
        }
        drop(breaker);

        let max_attempts = self.config.max_retries + 1;
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < max_attempts {
            attempts += 1;
            let attempt_start = Instant::now();
            let result = call();
            let elapsed = attempt_start.elapsed();

            match result {
                Ok(value) => {
                    Self::record_request_metrics(engine, operation, elapsed, "success");
                    let breaker_state = self.record_breaker_success_state();
                    Self::record_breaker_state(engine, breaker_state);
                    span.record("status", "success");
                    return Ok(value);
                },
                Err(err) => {
                    match self.handle_failure(engine, operation, err, elapsed, attempts, max_attempts)
                    {
                        FailureAction::Retry(err) => last_error = Some(err),
                        FailureAction::Fail(err) => return Err(err),
                    }
                },
            }
        }

        Err(last_error.unwrap_or_else(|| Error::EngineUnavailable {
            operation: operation.to_string(),
            cause: "exhausted retries".to_string(),
        }))
    }

    fn handle_failure(
        &self,
        engine: &'static str,
        operation: &'static str,
        err: Error,
        elapsed: Duration,
        attempts: u32,
        max_attempts: u32,
    ) -> FailureAction {
        let transient = err.is_transient();
        let retryable = transient && attempts < max_attempts;
        let status = if transient { "unavailable" } else { "error" };
        Self::record_request_metrics(engine, operation, elapsed, status);

        let span = tracing::Span::current();
        span.record("status", status);
        span.record("error", tracing::field::display(&err));

        if !transient {
            // the engine answered, so a half-open trial has succeeded
            let breaker_state = self.record_breaker_success_state();
            Self::record_breaker_state(engine, breaker_state);
            return FailureAction::Fail(err);
        }

        let mut breaker = self.breaker.lock().unwrap_or_else(PoisonError::into_inner);
        let tripped = breaker.on_failure();
        let breaker_state = breaker.state_value();
        drop(breaker);
        Self::record_breaker_state(engine, breaker_state);
        if tripped {
            tracing::warn!("Search engine circuit breaker opened for engine={engine} operation={operation}");
            return FailureAction::Fail(err);
        }

        if retryable {
            metrics::counter!(
                "search_engine_retries_total",
                "engine" => engine,
                "operation" => operation
            )
            .increment(1);
            tracing::warn!(
                "Retrying search engine call engine={engine} operation={operation} attempt={attempts} elapsed_ms={}",
                elapsed.as_millis()
            );
            if self.config.retry_backoff_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.config.retry_backoff_ms));
            }
            return FailureAction::Retry(err);
        }

        FailureAction::Fail(err)
    }

    fn record_breaker_success_state(&self) -> u8 {
        let mut breaker = self.breaker.lock().unwrap_or_else(PoisonError::into_inner);
        breaker.on_success();
        breaker.state_value()
    }

    fn record_request_metrics(
        engine: &'static str,
        operation: &'static str,
        elapsed: Duration,
        status: &'static str,
    ) {
        metrics::counter!(
            "search_engine_requests_total",
            "engine" => engine,
            "operation" => operation,
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "search_engine_request_duration_ms",
            "engine" => engine,
            "operation" => operation,
            "status" => status
        )
        .record(elapsed.as_secs_f64() * 1000.0);
    }

    fn record_breaker_state(engine: &'static str, breaker_state: u8) {
        metrics::gauge!("search_engine_circuit_breaker_state", "engine" => engine)
            .set(f64::from(breaker_state));
    }
}

impl<E: SearchEngine> SearchEngine for ResilientEngine<E> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn select(&self, request: &SearchRequest) -> Result<Value> {
        self.execute("select", || self.inner.select(request))
    }

    fn add(&self, documents: &[Document]) -> Result<()> {
        self.execute("add", || self.inner.add(documents))
    }

    fn delete_by_query(&self, query: &str) -> Result<()> {
        self.execute("delete", || self.inner.delete_by_query(query))
    }

    fn commit(&self) -> Result<()> {
        self.execute("commit", || self.inner.commit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Returns queued results for `commit`, then `Ok`.
    struct ScriptedEngine {
        results: Mutex<VecDeque<Result<()>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedEngine {
        fn new(results: Vec<Result<()>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl SearchEngine for ScriptedEngine {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn select(&self, _request: &SearchRequest) -> Result<Value> {
            Ok(Value::Null)
        }

        fn add(&self, _documents: &[Document]) -> Result<()> {
            Ok(())
        }

        fn delete_by_query(&self, _query: &str) -> Result<()> {
            Ok(())
        }

        fn commit(&self) -> Result<()> {
            *self.calls.lock().unwrap() += 1;
            self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn unavailable() -> Error {
        Error::EngineUnavailable {
            operation: "commit".to_string(),
            cause: "connect error".to_string(),
        }
    }

    fn config(max_retries: u32, threshold: u32) -> ResilienceConfig {
        ResilienceConfig {
            max_retries,
            retry_backoff_ms: 0,
            breaker_failure_threshold: threshold,
            breaker_reset_timeout_ms: 60_000,
        }
    }

    #[test]
    fn test_transient_failure_retried() {
        let engine = ResilientEngine::new(
            ScriptedEngine::new(vec![Err(unavailable()), Err(unavailable())]),
            config(2, 10),
        );
        assert!(engine.commit().is_ok());
        assert_eq!(engine.inner().calls(), 3);
    }

    #[test]
    fn test_retries_bounded() {
        let engine = ResilientEngine::new(
            ScriptedEngine::new(vec![Err(unavailable()), Err(unavailable()), Err(unavailable())]),
            config(1, 10),
        );
        assert!(engine.commit().is_err());
        assert_eq!(engine.inner().calls(), 2);
    }

    #[test]
    fn test_client_error_not_retried() {
        let bad_request = Error::EngineError {
            operation: "commit".to_string(),
            status: 400,
            body: "undefined field".to_string(),
        };
        let engine = ResilientEngine::new(ScriptedEngine::new(vec![Err(bad_request)]), config(3, 10));
        let err = engine.commit().unwrap_err();
        assert!(matches!(err, Error::EngineError { status: 400, .. }));
        assert_eq!(engine.inner().calls(), 1);
    }

    #[test]
    fn test_breaker_opens_after_threshold() {
        let engine = ResilientEngine::new(
            ScriptedEngine::new(vec![Err(unavailable()), Err(unavailable())]),
            config(0, 2),
        );
        assert!(engine.commit().is_err());
        assert!(engine.commit().is_err());

        let err = engine.commit().unwrap_err();
        assert!(err.to_string().contains("circuit breaker open"));
        assert_eq!(engine.inner().calls(), 2);
    }

    #[test]
    fn test_breaker_half_open_recovers() {
        let engine = ResilientEngine::new(
            ScriptedEngine::new(vec![Err(unavailable())]),
            ResilienceConfig {
                breaker_reset_timeout_ms: 0,
                ..config(0, 1)
            },
        );
        assert!(engine.commit().is_err());
        // reset timeout of zero lets the next call through as a trial
        assert!(engine.commit().is_ok());
        assert!(engine.commit().is_ok());
        assert_eq!(engine.inner().calls(), 3);
    }

    #[test]
    fn test_client_error_closes_half_open_breaker() {
        let bad_request = Error::EngineError {
            operation: "commit".to_string(),
            status: 400,
            body: "undefined field".to_string(),
        };
        let engine = ResilientEngine::new(
            ScriptedEngine::new(vec![Err(unavailable()), Err(bad_request)]),
            ResilienceConfig {
                breaker_reset_timeout_ms: 0,
                ..config(0, 1)
            },
        );
        assert!(engine.commit().is_err());
        let err = engine.commit().unwrap_err();
        assert!(matches!(err, Error::EngineError { status: 400, .. }));
        assert!(engine.commit().is_ok());
        assert_eq!(engine.inner().calls(), 3);
    }
}
