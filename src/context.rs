//! Per-thread slot exposing the in-flight request to nested code.
//!
//! Filters and handlers receive the request explicitly; this slot exists for
//! code further down the call stack that has no request in hand (audit hooks,
//! log enrichment). The router installs a [`ContextGuard`] for the whole
//! lifetime of a `route` call. Dropping the guard puts back whatever the slot
//! held before, so the request never leaks into unrelated work picked up later
//! by the same worker thread, even when a handler fails or panics, and a
//! request routed from inside another handler hands the slot back to the
//! outer request when it finishes.

use std::cell::RefCell;
use std::sync::Arc;

use http::Method;

use crate::ids::RequestId;

thread_local! {
    static CURRENT: RefCell<Option<Arc<RequestInfo>>> = const { RefCell::new(None) };
}

/// Snapshot of the request being handled on this thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
}

/// Holds the current-request slot for as long as it lives.
#[must_use = "the request context is reset as soon as the guard is dropped"]
pub struct ContextGuard {
    info: Arc<RequestInfo>,
    previous: Option<Arc<RequestInfo>>,
}

impl ContextGuard {
    pub fn enter(info: RequestInfo) -> Self {
        let info = Arc::new(info);
        let previous = CURRENT.with(|slot| slot.borrow_mut().replace(Arc::clone(&info)));
        Self { info, previous }
    }

    #[must_use]
    pub fn info(&self) -> &RequestInfo {
        &self.info
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // try_with: the thread may be tearing down its locals
        CURRENT
            .try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = previous;
                }
            })
            .ok();
    }
}

/// Whether a request is being routed on this thread. Usable from panic hooks
/// and during thread teardown.
pub(crate) fn in_request() -> bool {
    CURRENT
        .try_with(|slot| slot.try_borrow().is_ok_and(|slot| slot.is_some()))
        .unwrap_or(false)
}

/// The request currently being routed on this thread, if any.
#[must_use]
pub fn current_request() -> Option<Arc<RequestInfo>> {
    CURRENT.with(|slot| slot.borrow().clone())
}
