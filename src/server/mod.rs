//! Transport-facing request and response capabilities, their in-memory
//! implementations, and the bundled `tiny_http` server.

pub mod http_server;
pub mod request;
pub mod response;

pub use http_server::{HttpServer, ServerHandle, DEFAULT_WORKERS};
pub use request::{HeaderVec, HttpRequest, RouteRequest};
pub use response::{
    HttpResponse, JsonCommand, ResponseBody, RouteResponse, CODE_FORBIDDEN_ACCESS,
    CODE_INTERNAL_ERROR, CODE_NOT_FOUND, CONTENT_TYPE_JSON,
};
