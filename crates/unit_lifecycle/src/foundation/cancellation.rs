//! Cooperative cancellation for asynchronous lifecycle work
//!
//! A [`CancellationToken`] is a cheap, cloneable handle over one or more
//! shared reset events. Linking two tokens produces a third that fires when
//! either parent fires, which is how the factory combines a caller's signal
//! with its own "subsystem disposed" signal.

use std::future::Future;
use std::sync::Arc;

use futures::future::{self, Either};
use futures_intrusive::sync::ManualResetEvent;

use crate::error::{LifecycleError, LifecycleResult};

/// Cloneable cancellation signal
///
/// Clones share state: cancelling one clone cancels them all. Tokens created
/// through [`CancellationToken::linked_with`] observe their parents but own a
/// separate event, so cancelling the linked token leaves the parents untouched.
#[derive(Clone)]
pub struct CancellationToken {
    /// Event this token fires on `cancel()`
    own: Arc<ManualResetEvent>,
    /// Events of linked parents
    parents: Vec<Arc<ManualResetEvent>>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled
    pub fn new() -> Self {
        Self {
            own: Arc::new(ManualResetEvent::new(false)),
            parents: Vec::new(),
        }
    }

    /// Create a token that is already cancelled
    pub fn cancelled_token() -> Self {
        let token = Self::new();
        token.cancel();
        token
    }

    /// Signal cancellation to every holder of this token
    pub fn cancel(&self) {
        self.own.set();
    }

    /// Whether this token or any linked parent has fired
    pub fn is_cancelled(&self) -> bool {
        self.events().any(|event| event.is_set())
    }

    /// Return `Err(Cancelled)` if the token has fired
    pub fn check(&self) -> LifecycleResult<()> {
        if self.is_cancelled() {
            Err(LifecycleError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Create a token that fires when either `self` or `other` fires
    pub fn linked_with(&self, other: &CancellationToken) -> CancellationToken {
        let parents = self.events().chain(other.events()).cloned().collect();
        Self {
            own: Arc::new(ManualResetEvent::new(false)),
            parents,
        }
    }

    /// Resolve once the token (or any linked parent) fires
    pub async fn cancelled(&self) {
        let waits = self.events().map(|event| Box::pin(event.wait()));
        future::select_all(waits).await;
    }

    /// Drive `work` to completion unless the token fires first
    ///
    /// Work that loses the race is dropped before this returns.
    pub async fn run_until_cancelled<F: Future>(&self, work: F) -> LifecycleResult<F::Output> {
        self.check()?;
        let cancelled = Box::pin(self.cancelled());
        match future::select(Box::pin(work), cancelled).await {
            Either::Left((output, _)) => Ok(output),
            Either::Right(_) => Err(LifecycleError::Cancelled),
        }
    }

    fn events(&self) -> impl Iterator<Item = &Arc<ManualResetEvent>> {
        std::iter::once(&self.own).chain(self.parents.iter())
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("linked", &self.parents.len())
            .finish()
    }
}
