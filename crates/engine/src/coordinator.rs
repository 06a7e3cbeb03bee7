// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Refcounted access to a shared upstream provider process.
//!
//! Concurrent `acquire` calls for the same key that arrive while a startup
//! is in flight all await the same [`futures::future::Shared`] future and
//! all succeed or fail together, rather than racing to start their own
//! copies of the provider process.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;

#[derive(Debug, Clone, thiserror::Error)]
#[error("startup failed: {0}")]
pub struct StartupError(pub String);

use std::pin::Pin;
type BoxStartup<H> =
    Pin<Box<dyn Future<Output = Result<Arc<H>, StartupError>> + Send + 'static>>;

struct Lease<H> {
    handle: Option<Arc<H>>,
    refcount: i64,
    pending: Option<Shared<BoxStartup<H>>>,
}

impl<H> Default for Lease<H> {
    fn default() -> Self {
        Self {
            handle: None,
            refcount: 0,
            pending: None,
        }
    }
}

/// `H` is the shared handle type (e.g. a connection to an upstream
/// provider process); `close` is invoked exactly once, when refcount drops
/// to zero.
pub struct SharedServerCoordinator<K, H, Close> {
    leases: Mutex<HashMap<K, Lease<H>>>,
    close: Close,
}

impl<K, H, Close> SharedServerCoordinator<K, H, Close>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    H: Send + Sync + 'static,
    Close: Fn(Arc<H>) + Send + Sync + 'static,
{
    pub fn new(close: Close) -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
            close,
        }
    }

    /// Acquire a handle for `key`, starting it via `start` if no live
    /// handle or in-flight startup exists. On startup failure, the
    /// speculative refcount increment is rolled back so the next `acquire`
    /// starts cleanly.
    pub async fn acquire<F>(&self, key: K, start: F) -> Result<Arc<H>, StartupError>
    where
        F: Future<Output = Result<H, StartupError>> + Send + 'static,
    {
        let pending_or_handle = {
            let mut leases = self.leases.lock();
            let lease = leases.entry(key.clone()).or_default();

            if let Some(handle) = &lease.handle {
                lease.refcount += 1;
                return Ok(handle.clone());
            }

            if let Some(pending) = &lease.pending {
                Err(pending.clone())
            } else {
                let boxed: BoxStartup<H> = Box::pin(async move { start.await.map(Arc::new) });
                let shared = boxed.shared();
                lease.pending = Some(shared.clone());
                lease.refcount += 1;
                Ok(shared)
            }
        };

        let shared = match pending_or_handle {
            Ok(shared) => shared,
            Err(shared) => {
                // A concurrent acquire is already starting; count ourselves
                // in too before awaiting the same future.
                let mut leases = self.leases.lock();
                leases.entry(key.clone()).or_default().refcount += 1;
                shared
            }
        };

        match shared.await {
            Ok(handle) => {
                let mut leases = self.leases.lock();
                let lease = leases.entry(key).or_default();
                lease.handle = Some(handle.clone());
                lease.pending = None;
                Ok(handle)
            }
            Err(e) => {
                let mut leases = self.leases.lock();
                if let Some(lease) = leases.get_mut(&key) {
                    lease.refcount -= 1;
                    lease.pending = None;
                    if lease.refcount <= 0 {
                        leases.remove(&key);
                    }
                }
                Err(e)
            }
        }
    }

    /// Release one reference on `key`. Closes the handle when the
    /// refcount reaches zero.
    pub fn release(&self, key: &K) {
        let handle_to_close = {
            let mut leases = self.leases.lock();
            let Some(lease) = leases.get_mut(key) else {
                return;
            };
            lease.refcount -= 1;
            if lease.refcount <= 0 {
                let handle = lease.handle.take();
                leases.remove(key);
                handle
            } else {
                None
            }
        };
        if let Some(handle) = handle_to_close {
            (self.close)(handle);
        }
    }

    pub fn refcount(&self, key: &K) -> i64 {
        self.leases.lock().get(key).map(|l| l.refcount).unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
