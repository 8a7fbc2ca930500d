#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use rubric_grader::{EvaluationRequest, Transport, TransportError};
use tokio::time::Instant;

/// One recorded evaluation call.
#[derive(Debug, Clone)]
pub struct Call {
    pub file:       String,
    pub prompt:     String,
    pub reference:  Option<String>,
    pub started_at: Instant,
}

#[derive(Default)]
struct State {
    script:     Mutex<VecDeque<Result<String, TransportError>>>,
    calls:      Mutex<Vec<Call>>,
    in_flight:  AtomicUsize,
    overlapped: AtomicBool,
}

/// Transport that replays scripted responses and records every call.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<State>,
}

impl ScriptedTransport {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<String, TransportError>>,
    {
        let transport = Self::default();
        transport
            .state
            .script
            .lock()
            .unwrap()
            .extend(script);
        transport
    }

    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Ok(r.into())))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.calls.lock().unwrap().len()
    }

    pub fn overlapped(&self) -> bool {
        self.state.overlapped.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    async fn evaluate(&self, request: EvaluationRequest<'_>) -> Result<String, TransportError> {
        if self.state.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.state.overlapped.store(true, Ordering::SeqCst);
        }
        self.state.calls.lock().unwrap().push(Call {
            file:       request.submission.name().to_string(),
            prompt:     request.prompt.to_string(),
            reference:  request.reference.map(|r| r.name().to_string()),
            started_at: Instant::now(),
        });

        tokio::task::yield_now().await;

        let next = self.state.script.lock().unwrap().pop_front();
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        next.unwrap_or_else(|| {
            Err(TransportError::InvalidResponse("no scripted response left".to_string()))
        })
    }
}

pub fn rate_limited() -> Result<String, TransportError> {
    Err(TransportError::from_status(
        429,
        r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#.to_string(),
    ))
}
