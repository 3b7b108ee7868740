//! # action-router
//!
//! A front-controller web router in the classic action style: every request
//! path is decomposed into an **action** (a registered handler, possibly named
//! by several segments such as `admin/user`), a **method** on that handler and
//! trailing **parameters**. `/report/view/2024/10` calls `view` on the `report`
//! handler with parameters `["2024", "10"]`.
//!
//! Around that core sit an ordered, path-selected filter chain, static asset
//! serving from a web root, a restricted `/WEB-INF/` area, and uniform JSON
//! error responses.
//!
//! ## Architecture
//!
//! - **[`router`]** - [`WebRouter`](router::WebRouter), its builder and the URL parser
//! - **[`dispatcher`]** - handler registry, proxies and method tables
//! - **[`filter`]** - filter chain and the built-in filters
//! - **[`static_files`]** - web-root asset resolution and MIME types
//! - **[`server`]** - request/response capabilities and the `tiny_http` server
//! - **[`config`]** - grouped configuration and file loading
//! - **[`context`]** - per-thread current-request slot
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - the `action-router` binary
//!
//! ## Quick Start
//!
//! ```rust
//! use action_router::dispatcher::{HandlerRequest, MethodTable, RequestHandler, SimpleHandlerProxy};
//! use action_router::router::WebRouter;
//! use action_router::server::{HttpResponse, RouteRequest, RouteResponse};
//!
//! struct ReportHandler;
//!
//! impl RequestHandler for ReportHandler {
//!     fn register_methods(table: &mut MethodTable<Self>) {
//!         table.method("view", |_, req: &HandlerRequest<'_>, res: &mut dyn HttpResponse| {
//!             res.set_data_by_json(&serde_json::json!({ "params": req.params() }));
//!             Ok(())
//!         });
//!     }
//! }
//!
//! let router = WebRouter::builder()
//!     .web_root("tests/staticdata")
//!     .handler("report", SimpleHandlerProxy::new(ReportHandler))
//!     .build()?;
//!
//! let mut res = RouteResponse::new();
//! router.route(&RouteRequest::get("/report/view/2024/10"), &mut res);
//! let body: serde_json::Value = serde_json::from_slice(&res.into_bytes()?)?;
//! assert_eq!(body["params"], serde_json::json!(["2024", "10"]));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod filter;
pub mod ids;
pub mod logging;
pub mod router;
pub mod server;
pub mod static_files;

pub use dispatcher::{HandlerRegistry, HandlerRequest, RequestHandler, SimpleHandlerProxy};
pub use error::StartupError;
pub use router::{RouterBuilder, WebRouter};
pub use server::{HttpRequest, HttpResponse};
