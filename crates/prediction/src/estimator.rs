//! Asynchronous risk estimation
//!
//! Each `estimate` call resolves the case name and patient-space point on the
//! calling thread, then performs the network round trip on its own worker
//! thread. Results come back as `RiskCompletion`s on a channel owned by the
//! estimator, in completion order. Requests are never coalesced or cancelled:
//! two requests for the same key both complete, and whichever finishes last is
//! the last one the caller sees.

use crate::client::PredictionService;
use crate::config::PredictionConfig;
use crate::projection::{image_point_to_patient_point, ImagePoint, MetadataProvider};
use crate::wire::{PredictionRequest, PredictionResponse};
use crate::{RiskError, RiskResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Identifier of a single estimation request
pub type RiskRequestId = u64;

/// Result of one estimation request
#[derive(Debug, Clone)]
pub struct RiskCompletion<K> {
    /// Request that produced this result
    pub request_id: RiskRequestId,

    /// Caller-supplied routing key
    pub key: K,

    /// Service response or the failure that replaced it
    pub outcome: RiskResult<PredictionResponse>,
}

/// Handle to an in-flight estimation
///
/// Dropping the handle does not cancel the request.
pub struct RiskHandle {
    request_id: RiskRequestId,
    thread: Option<JoinHandle<()>>,
}

impl RiskHandle {
    /// Get the request ID
    pub fn request_id(&self) -> RiskRequestId {
        self.request_id
    }

    /// Check if the worker has finished
    ///
    /// Requests that failed before reaching the network have no worker and
    /// are always finished.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Block until the worker has delivered its completion
    pub fn wait(mut self) -> RiskResult<()> {
        match self.thread.take() {
            Some(handle) => handle.join().map_err(|_| RiskError::WorkerLost),
            None => Ok(()),
        }
    }
}

/// Issues risk requests and collects their completions
pub struct RiskEstimator<K> {
    service: Arc<dyn PredictionService>,
    metadata: Arc<dyn MetadataProvider>,
    model_name: String,
    zone: String,
    next_request_id: AtomicU64,
    completion_tx: Sender<RiskCompletion<K>>,
    completion_rx: Receiver<RiskCompletion<K>>,
}

impl<K: Send + 'static> RiskEstimator<K> {
    /// Create an estimator using the model and zone from `config`
    pub fn new(
        service: Arc<dyn PredictionService>,
        metadata: Arc<dyn MetadataProvider>,
        config: &PredictionConfig,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            service,
            metadata,
            model_name: config.model_name.clone(),
            zone: config.zone.clone(),
            next_request_id: AtomicU64::new(1),
            completion_tx,
            completion_rx,
        }
    }

    /// Build the request body for an anchor on an image
    pub fn build_request(&self, image_id: &str, anchor: ImagePoint) -> RiskResult<PredictionRequest> {
        let case = self
            .metadata
            .patient_name(image_id)
            .ok_or_else(|| RiskError::MissingMetadata {
                image_id: image_id.to_string(),
                what: "patient",
            })?;
        let plane = self
            .metadata
            .image_plane(image_id)
            .ok_or_else(|| RiskError::MissingMetadata {
                image_id: image_id.to_string(),
                what: "image plane",
            })?;

        let lps = image_point_to_patient_point(anchor, &plane);
        Ok(PredictionRequest::new(case, &self.model_name, &self.zone, lps))
    }

    /// Start an estimation for `anchor` on `image_id`
    ///
    /// The completion is tagged with `key` and delivered through
    /// `try_next_completion` / `next_completion`.
    pub fn estimate(&self, key: K, image_id: &str, anchor: ImagePoint) -> RiskHandle {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);

        let request = match self.build_request(image_id, anchor) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(request_id, image_id, "risk request not sent: {err}");
                // The receiver lives in self, so this cannot fail
                let _ = self.completion_tx.send(RiskCompletion {
                    request_id,
                    key,
                    outcome: Err(err),
                });
                return RiskHandle {
                    request_id,
                    thread: None,
                };
            }
        };

        let service = Arc::clone(&self.service);
        let tx = self.completion_tx.clone();

        let thread = std::thread::spawn(move || {
            let outcome = service.predict(&request);
            if let Err(err) = &outcome {
                tracing::warn!(request_id, "risk request failed: {err}");
            }
            // The estimator may be gone by now; nobody is left to notify
            let _ = tx.send(RiskCompletion {
                request_id,
                key,
                outcome,
            });
        });

        tracing::debug!(request_id, image_id, "risk request issued");

        RiskHandle {
            request_id,
            thread: Some(thread),
        }
    }

    /// Take the next completion if one is ready
    pub fn try_next_completion(&self) -> Option<RiskCompletion<K>> {
        self.completion_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next completion
    pub fn next_completion(&self, timeout: Duration) -> Option<RiskCompletion<K>> {
        match self.completion_rx.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take every completion that is ready, in arrival order
    pub fn drain_completions(&self) -> Vec<RiskCompletion<K>> {
        self.completion_rx.try_iter().collect()
    }
}
