//! Location and backtrace of panics raised while a request is routed.
//!
//! A caught panic payload carries only its message. The hook installed here
//! runs at the panic site, so it can still see where the panic happened; it
//! leaves the report in a per-thread slot for the router to pick up after
//! `catch_unwind` returns. Panics outside a `route` call are passed straight
//! to the previously installed hook.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::RefCell;
use std::panic;
use std::sync::Once;

use crate::context::in_request;

thread_local! {
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Chain the recording hook in front of the current one. Idempotent.
pub(crate) fn install_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if in_request() {
                let location = info
                    .location()
                    .map_or_else(|| "unknown location".to_string(), ToString::to_string);
                // honours RUST_BACKTRACE / RUST_LIB_BACKTRACE
                let backtrace = Backtrace::capture();
                let report = match backtrace.status() {
                    BacktraceStatus::Captured => format!("{location}\n{backtrace}"),
                    _ => location,
                };
                LAST_PANIC
                    .try_with(|slot| {
                        if let Ok(mut slot) = slot.try_borrow_mut() {
                            *slot = Some(report);
                        }
                    })
                    .ok();
            }
            previous(info);
        }));
    });
}

/// Report of the last panic recorded on this thread, if any.
pub(crate) fn take_report() -> Option<String> {
    LAST_PANIC
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextGuard, RequestInfo};
    use crate::ids::RequestId;

    #[test]
    fn test_records_location_only_inside_a_request() {
        install_hook();
        take_report();

        let outside = panic::catch_unwind(|| panic!("not routed"));
        assert!(outside.is_err());
        assert!(take_report().is_none());

        let inside = panic::catch_unwind(|| {
            let _guard = ContextGuard::enter(RequestInfo {
                request_id: RequestId::new(),
                method: http::Method::GET,
                path: "/boom".to_string(),
            });
            panic!("routed")
        });
        assert!(inside.is_err());
        let report = take_report().unwrap();
        assert!(report.starts_with(file!()), "report: {report}");
        assert!(take_report().is_none());
    }
}
