//! Correlate inbound responses with a waiting driver.
//!
//! The [Correlator] holds exactly one slot per connection: the most recently delivered response.
//! The receive path overwrites the slot without ever blocking, and a driver waits for a response
//! that is strictly newer than the last one it consumed.
//!
//! Newness is judged by delivery, not by content. Each recorded response is stamped with a
//! sequence number one greater than the previous delivery, so a peer that answers two polls with
//! bit-identical responses still produces two distinct observations.

use crate::{wire::SignedResponse, Error};
use std::{ops::Deref, sync::Arc, time::Duration};
use tokio::{sync::watch, time};
use tracing::debug;

/// A response together with its delivery sequence.
#[derive(Clone, Debug)]
pub struct Observed {
    sequence: u64,
    inner: Arc<SignedResponse>,
}

impl Observed {
    /// Position of this response in the connection's delivery order (starting at 1).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn response(&self) -> &SignedResponse {
        &self.inner
    }
}

impl Deref for Observed {
    type Target = SignedResponse;

    fn deref(&self) -> &SignedResponse {
        &self.inner
    }
}

impl PartialEq for Observed {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for Observed {}

/// Single-slot store of the latest response on a connection.
#[derive(Clone)]
pub struct Correlator {
    slot: Arc<watch::Sender<Option<Observed>>>,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
        }
    }

    /// Stores `response` as the latest observation, waking any waiter.
    pub fn record(&self, response: SignedResponse) -> Observed {
        let mut observed = Observed {
            sequence: 0,
            inner: Arc::new(response),
        };
        self.slot.send_modify(|slot| {
            observed.sequence = slot.as_ref().map_or(1, |last| last.sequence + 1);
            *slot = Some(observed.clone());
        });
        debug!(sequence = observed.sequence, "recorded response");
        observed
    }

    /// Returns the latest observation without waiting.
    pub fn latest(&self) -> Option<Observed> {
        self.slot.borrow().clone()
    }

    /// Waits for an observation newer than `previous` (or any observation if `previous` is
    /// `None`).
    ///
    /// Returns [Error::Timeout] if none arrives within `timeout`. Never returns `previous` or
    /// anything delivered before it.
    pub async fn await_new(
        &self,
        previous: Option<&Observed>,
        timeout: Duration,
    ) -> Result<Observed, Error> {
        let floor = previous.map_or(0, Observed::sequence);
        let mut receiver = self.slot.subscribe();
        let result = time::timeout(
            timeout,
            receiver.wait_for(|slot| slot.as_ref().is_some_and(|last| last.sequence > floor)),
        )
        .await;
        let observed = match result {
            Ok(Ok(slot)) => (*slot).clone().ok_or(Error::Closed)?,
            Ok(Err(_)) => return Err(Error::Closed),
            Err(_) => return Err(Error::Timeout(timeout)),
        };
        Ok(observed)
    }
}
