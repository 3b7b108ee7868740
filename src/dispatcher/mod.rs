//! # Dispatcher Module
//!
//! Handler registry and handler proxies: everything the router needs to turn
//! a parsed [`Route`](crate::router::Route) into a method call.
//!
//! ## Overview
//!
//! - [`HandlerRegistry`] maps an action name to a [`HandlerProxy`]. It is built
//!   once at startup through [`HandlerRegistryBuilder`] and never mutated
//!   afterwards, so request threads share it without locks.
//! - [`HandlerProxy`] is the capability set the router relies on:
//!   `has_method` (used while parsing the URL) and `invoke`.
//! - [`SimpleHandlerProxy`] implements the proxy over a plain handler value and
//!   a [`MethodTable`]. The table is the handler's complete list of invocable
//!   methods, declared once through [`RequestHandler::register_methods`], so
//!   `has_method` is a hash lookup on the hot path.
//! - [`HandlerDiscovery`] is the startup hook that fills the registry from the
//!   configured work base.
//!
//! ## Handler Registration
//!
//! ```rust
//! use action_router::dispatcher::{
//!     HandlerRegistry, HandlerRequest, MethodTable, RequestHandler, SimpleHandlerProxy,
//! };
//! use action_router::server::HttpResponse;
//!
//! struct ReportHandler;
//!
//! impl RequestHandler for ReportHandler {
//!     fn register_methods(table: &mut MethodTable<Self>) {
//!         table.method("view", |_, req, res| {
//!             res.set_data_by_json(&serde_json::json!({ "params": req.params() }));
//!             Ok(())
//!         });
//!     }
//! }
//!
//! let mut builder = HandlerRegistry::builder();
//! builder.register("report", SimpleHandlerProxy::new(ReportHandler));
//! let registry = builder.build();
//! assert!(registry.get("report").unwrap().has_method("view"));
//! ```
//!
//! ## Error Handling
//!
//! Handler methods return `anyhow::Result<()>`. The proxy never interprets the
//! error; it reaches the router untouched and is turned into an internal-error
//! response there.

mod core;
mod proxy;

pub use core::{HandlerDiscovery, HandlerRegistry, HandlerRegistryBuilder};
pub use proxy::{
    HandlerMethod, HandlerProxy, HandlerRequest, MethodTable, RequestHandler, SimpleHandlerProxy,
};
