//! # Router Module
//!
//! The front controller. [`WebRouter::route`] takes every request through a
//! fixed lifecycle:
//!
//! 1. **Normalize**: an empty or `/` path becomes [`WELCOME_PATH`].
//! 2. **Restricted path**: anything under `/WEB-INF/` is answered 403.
//! 3. **Filters**: the configured filters whose pattern matches run in order;
//!    one that reports "handled" ends the request.
//! 4. **Static assets**: when `ignoreUrl` matches, the file under the web root
//!    is streamed with a MIME type from its extension, or 404.
//! 5. **Dispatch**: [`parse_url`] splits the path into action, method and
//!    parameters against the handler registry; unknown actions and methods
//!    are answered 404 with a JSON command naming them.
//!
//! Errors and panics raised in steps 3 to 5 are logged with their full trace
//! and answered 500 with a JSON command carrying the message and the trace.
//! The current-request context is cleared before `route` returns, whatever
//! happened.
//!
//! ## Example
//!
//! ```rust
//! use action_router::config::{ConfigGroups, WebConfig};
//! use action_router::router::WebRouter;
//! use action_router::server::{RouteRequest, RouteResponse};
//!
//! let groups = ConfigGroups::from_triples([("web", "ignoreUrl", r"\.css$")]);
//! let router = WebRouter::builder()
//!     .web_root("tests/staticdata")
//!     .config(WebConfig::from_groups(&groups))
//!     .build()
//!     .unwrap();
//!
//! let mut res = RouteResponse::new();
//! router.route(&RouteRequest::get("/WEB-INF/secrets.txt"), &mut res);
//! assert_eq!(res.status.as_u16(), 403);
//! ```

mod builder;
mod core;
mod panics;
pub mod url;

pub use builder::RouterBuilder;
pub use core::{WebRouter, REQUEST_ID_HEADER, RESTRICTED_SEGMENT, WELCOME_PATH};
pub use url::{parse_url, ParamVec, Route, DEFAULT_METHOD, METHOD_NAMES_KEY};
