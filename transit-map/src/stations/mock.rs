//! Scripted geocoder for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::GeoCoordinate;

use super::client::Geocoder;
use super::error::GeocodeError;

/// One scripted answer.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Found(f64, f64),
    /// Empty result list
    Empty,
    /// 503 from the server
    Unavailable,
    /// The client gave up waiting for a request slot
    PastDeadline,
}

/// Geocoder answering from a per-name script and recording every call.
///
/// Replies for a name are consumed in order; the last one repeats. Names
/// without a script get [`Reply::Empty`].
#[derive(Debug, Default)]
pub struct MockGeocoder {
    script: Mutex<HashMap<String, Vec<Reply>>>,
    calls: Mutex<Vec<String>>,
    latency: Duration,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: &str, replies: &[Reply]) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(name.to_string(), replies.to_vec());
        self
    }

    /// Sleep this long before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn found(self, name: &str, lat: f64, lon: f64) -> Self {
        self.with(name, &[Reply::Found(lat, lon)])
    }

    /// Names passed to `resolve`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Geocoder for MockGeocoder {
    async fn resolve(&self, name: &str) -> Result<GeoCoordinate, GeocodeError> {
        self.calls.lock().unwrap().push(name.to_string());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = {
            let mut script = self.script.lock().unwrap();
            match script.get_mut(name) {
                Some(replies) if replies.len() > 1 => replies.remove(0),
                Some(replies) => replies.first().copied().unwrap_or(Reply::Empty),
                None => Reply::Empty,
            }
        };

        match reply {
            Reply::Found(lat, lon) => Ok(GeoCoordinate::new(lat, lon)?),
            Reply::Empty => Err(GeocodeError::NotFound {
                query: name.to_string(),
            }),
            Reply::Unavailable => Err(GeocodeError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            }),
            Reply::PastDeadline => Err(GeocodeError::DeadlineExceeded),
        }
    }
}
