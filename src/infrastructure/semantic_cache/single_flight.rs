//! Single-flight coordination keyed by embedding neighbourhood
//!
//! Two calls are equivalent when their embeddings are within the cache's
//! distance threshold of each other. The first caller for a neighbourhood
//! becomes the leader and runs the computation; later equivalent callers
//! subscribe to the leader's result instead of computing their own.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::embedding::cosine_distance;
use crate::domain::DomainError;
use crate::infrastructure::observability::metrics;

type Outcome<T> = Option<Result<T, DomainError>>;

#[derive(Debug)]
struct Flight<T> {
    id: u64,
    key: Vec<f32>,
    result: watch::Receiver<Outcome<T>>,
}

/// Registry of in-flight computations
#[derive(Debug)]
pub struct SingleFlight<T> {
    distance_threshold: f32,
    flights: Mutex<Vec<Flight<T>>>,
    next_id: AtomicU64,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(distance_threshold: f32) -> Self {
        Self {
            distance_threshold,
            flights: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of computations currently running
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    /// Run `compute` unless an equivalent computation is already in flight,
    /// in which case wait for and return its result.
    ///
    /// Cancelling `cancel` abandons this caller's wait; if this caller is the
    /// leader, every follower receives the cancellation error.
    pub async fn run<F, Fut>(
        &self,
        key: &[f32],
        cancel: &CancellationToken,
        compute: F,
    ) -> Result<T, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let (flight_id, sender, follower) = {
            let mut flights = self.lock();

            match flights
                .iter()
                .find(|flight| cosine_distance(key, &flight.key) < self.distance_threshold)
            {
                Some(flight) => (flight.id, None, Some(flight.result.clone())),
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let (tx, rx) = watch::channel(None);
                    flights.push(Flight {
                        id,
                        key: key.to_vec(),
                        result: rx,
                    });
                    (id, Some(tx), None)
                }
            }
        };

        if let Some(receiver) = follower {
            metrics::record_single_flight_coalesced();
            debug!(flight_id, "Joined in-flight computation");
            return Self::follow(receiver, cancel).await;
        }

        let Some(sender) = sender else {
            return Err(DomainError::internal("single-flight leader without sender"));
        };

        let mut guard = FlightGuard {
            registry: &self.flights,
            id: flight_id,
            sender: Some(sender),
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(DomainError::cancelled("request cancelled while computing")),
            result = compute() => result,
        };

        guard.complete(result.clone());
        result
    }

    async fn follow(
        mut receiver: watch::Receiver<Outcome<T>>,
        cancel: &CancellationToken,
    ) -> Result<T, DomainError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(DomainError::cancelled("request cancelled while waiting")),
            outcome = receiver.wait_for(Option::is_some) => match outcome {
                Ok(value) => match value.as_ref() {
                    Some(result) => result.clone(),
                    None => Err(DomainError::internal("single-flight outcome missing")),
                },
                Err(_) => Err(DomainError::cancelled("in-flight computation was abandoned")),
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Flight<T>>> {
        self.flights.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Publishes the leader's outcome and unregisters the flight, also when the
/// leader future is dropped before finishing.
struct FlightGuard<'a, T> {
    registry: &'a Mutex<Vec<Flight<T>>>,
    id: u64,
    sender: Option<watch::Sender<Outcome<T>>>,
}

impl<T> FlightGuard<'_, T> {
    fn complete(&mut self, result: Result<T, DomainError>) {
        if let Some(sender) = self.sender.take() {
            sender.send_replace(Some(result));
            self.unregister();
        }
    }

    fn unregister(&self) {
        let mut flights = self
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        flights.retain(|flight| flight.id != self.id);
    }
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            sender.send_replace(Some(Err(DomainError::cancelled(
                "in-flight computation was dropped",
            ))));
            self.unregister();
        }
    }
}
