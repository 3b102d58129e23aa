//! Per-fingerprint in-flight deduplication.
//!
//! The first request for a fingerprint becomes the leader and computes.
//! Requests arriving while it runs become followers and wait for the
//! leader's published outcome instead of repeating the reasoning calls.

use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use tokio::sync::watch;

use intentlens_core::types::{CacheEntry, Fingerprint};

use crate::reasoning::StageFailure;

/// Outcome a leader publishes to its followers.
pub type FlightOutcome = std::result::Result<CacheEntry, StageFailure>;

type Slot = watch::Receiver<Option<FlightOutcome>>;

/// Registry of fingerprints currently being computed.
#[derive(Default)]
pub struct InFlightRegistry {
    flights: Arc<DashMap<Fingerprint, Slot>>,
}

/// Role assigned by [`InFlightRegistry::join`].
pub enum Flight {
    Leader(FlightLeader),
    Follower(FlightFollower),
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` or attach to the computation already claiming it.
    pub fn join(&self, key: &Fingerprint) -> Flight {
        match self.flights.entry(key.clone()) {
            Entry::Occupied(existing) => Flight::Follower(FlightFollower {
                rx: existing.get().clone(),
            }),
            Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(None);
                slot.insert(rx);
                Flight::Leader(FlightLeader {
                    key: key.clone(),
                    tx,
                    flights: self.flights.clone(),
                })
            }
        }
    }

    /// Number of fingerprints currently in flight.
    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

/// Computes the outcome for one fingerprint.
///
/// The in-flight marker is cleared when the leader is dropped, whether or
/// not it published. Followers of a leader that never published see
/// `None` from [`FlightFollower::wait`].
pub struct FlightLeader {
    key: Fingerprint,
    tx: watch::Sender<Option<FlightOutcome>>,
    flights: Arc<DashMap<Fingerprint, Slot>>,
}

impl FlightLeader {
    /// Publish the outcome to every follower and release the fingerprint.
    pub fn complete(self, outcome: FlightOutcome) {
        // Stored even when no follower is attached yet.
        self.tx.send_modify(|slot| *slot = Some(outcome));
    }
}

impl Drop for FlightLeader {
    fn drop(&mut self) {
        self.flights.remove(&self.key);
    }
}

/// Waits for a leader's outcome.
pub struct FlightFollower {
    rx: Slot,
}

impl FlightFollower {
    /// The leader's outcome, or `None` if it went away without publishing.
    pub async fn wait(mut self) -> Option<FlightOutcome> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        }
    }
}
