//! Test Doubles
//!
//! Scripted [`HttpJsonClient`] and a [`Sleeper`] that records instead of waiting.
//! Enabled for downstream crates with the `testing` feature.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::retry::Sleeper;
use crate::transport::{Failure, HttpJsonClient, RequestOptions, RequestOutcome};

type Scripted = Result<RequestOutcome, TransportError>;

/// A request as the scripted client received it
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub options: RequestOptions,
}

/// Replays queued outcomes in order, then repeats the fallback
pub struct ScriptedClient {
    queue: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Scripted>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Ok(RequestOutcome::Failure(Failure::transport(
                "no scripted response",
            )))),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_outcome(&self, outcome: RequestOutcome) {
        lock(&self.queue).push_back(Ok(outcome));
    }

    pub fn push_error(&self, error: TransportError) {
        lock(&self.queue).push_back(Err(error));
    }

    pub fn set_fallback(&self, outcome: RequestOutcome) {
        *lock(&self.fallback) = Ok(outcome);
    }

    pub fn set_fallback_error(&self, error: TransportError) {
        *lock(&self.fallback) = Err(error);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl HttpJsonClient for ScriptedClient {
    async fn request(&self, url: &str, options: &RequestOptions) -> Scripted {
        lock(&self.requests).push(RecordedRequest {
            url: url.to_string(),
            options: options.clone(),
        });
        let next = lock(&self.queue).pop_front();
        next.unwrap_or_else(|| lock(&self.fallback).clone())
    }
}

/// Records every requested delay and returns immediately
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        lock(&self.delays).clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.delays).push(duration);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
