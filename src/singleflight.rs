//! Collapse concurrent demand for the same keyed operation into one execution.
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::trace;

type Flight<T> = Shared<BoxFuture<'static, T>>;
type Registry<K, T> = Arc<Mutex<HashMap<K, Flight<T>>>>;

/// Keyed registry of in-flight operations.
///
/// The lookup and the registration of a new flight happen under one lock with no await in
/// between, so two callers can never both start the same key. A flight removes its own slot
/// before handing out its output; whoever arrives after that starts a fresh one.
///
/// A flight is driven by the callers awaiting it. If every caller is dropped mid-flight, the
/// slot stays and the next caller for that key resumes it.
pub struct SingleFlight<K, T> {
    inflight: Registry<K, T>,
}

impl<K, T> Default for SingleFlight<K, T> {
    fn default() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K: Debug, T> Debug for SingleFlight<K, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SingleFlight")
            .field("pending", &inflight.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the flight registered under `key`, or start one from `make` if there is none.
    /// `make` is only called when this caller becomes the leader.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let flight = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            match inflight.get(&key) {
                Some(flight) => {
                    trace!(?key, "joining in-flight operation");
                    flight.clone()
                }
                None => {
                    trace!(?key, "starting operation");
                    let registry = Arc::clone(&self.inflight);
                    let slot = key.clone();
                    let work = make();
                    let flight = async move {
                        let output = work.await;
                        registry.lock().unwrap_or_else(PoisonError::into_inner).remove(&slot);
                        output
                    }
                    .boxed()
                    .shared();
                    inflight.insert(key, flight.clone());
                    flight
                }
            }
        };
        flight.await
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}
