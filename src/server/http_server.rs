use std::io::{self, Cursor, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use http::Method;
use tracing::{debug, info, warn};

use super::request::RouteRequest;
use super::response::{ResponseBody, RouteResponse};
use crate::router::WebRouter;

pub const DEFAULT_WORKERS: usize = 4;

/// Blocking HTTP/1.1 front end for a [`WebRouter`].
///
/// A fixed pool of worker threads pulls requests off one `tiny_http`
/// listener; each worker handles a single request at a time.
pub struct HttpServer {
    router: Arc<WebRouter>,
    workers: usize,
}

/// Handle to a running HTTP server
pub struct ServerHandle {
    addr: SocketAddr,
    server: Arc<tiny_http::Server>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// Returns `TimedOut` if the listener does not answer within ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Wake every worker, let in-flight requests finish and join the pool.
    pub fn stop(self) {
        for _ in &self.workers {
            self.server.unblock();
        }
        for worker in self.workers {
            if worker.join().is_err() {
                warn!("HTTP worker panicked during shutdown");
            }
        }
        info!(addr = %self.addr, "HTTP server stopped");
    }

    /// Block until every worker exits.
    pub fn join(self) -> thread::Result<()> {
        for worker in self.workers {
            worker.join()?;
        }
        Ok(())
    }
}

impl HttpServer {
    #[must_use]
    pub fn new(router: Arc<WebRouter>) -> Self {
        Self {
            router,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Number of worker threads; at least one.
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Bind `addr` and start the worker pool.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let server = tiny_http::Server::http(addr).map_err(|e| io::Error::other(e.to_string()))?;
        let addr = server.server_addr().to_ip().unwrap_or(addr);
        let server = Arc::new(server);

        let mut workers = Vec::with_capacity(self.workers);
        for index in 0..self.workers {
            let server = Arc::clone(&server);
            let router = Arc::clone(&self.router);
            let worker = thread::Builder::new()
                .name(format!("router-worker-{index}"))
                .spawn(move || {
                    for request in server.incoming_requests() {
                        handle_request(&router, request);
                    }
                    debug!(worker = index, "HTTP worker exiting");
                })?;
            workers.push(worker);
        }

        info!(addr = %addr, workers = self.workers, "HTTP server listening");
        Ok(ServerHandle {
            addr,
            server,
            workers,
        })
    }
}

fn handle_request(router: &WebRouter, request: tiny_http::Request) {
    let route_req = to_route_request(&request);
    let mut route_res = RouteResponse::new();
    router.route(&route_req, &mut route_res);

    if let Err(err) = request.respond(to_tiny_response(route_res)) {
        warn!(path = %route_req.path, error = %err, "Failed to write response");
    }
}

fn to_route_request(request: &tiny_http::Request) -> RouteRequest {
    let method = Method::from_bytes(request.method().as_str().as_bytes()).unwrap_or(Method::GET);
    let mut route_req = RouteRequest::from_target(method, request.url());
    for header in request.headers() {
        route_req.headers.push((
            Arc::from(header.field.as_str().as_str()),
            header.value.as_str().to_string(),
        ));
    }
    route_req
}

fn to_tiny_response(res: RouteResponse) -> tiny_http::Response<Box<dyn Read + Send>> {
    let status = tiny_http::StatusCode(res.status.as_u16());
    let headers: Vec<tiny_http::Header> = res
        .content_type
        .as_deref()
        .and_then(|ct| tiny_http::Header::from_bytes(&b"Content-Type"[..], ct.as_bytes()).ok())
        .into_iter()
        .collect();

    let (body, length): (Box<dyn Read + Send>, Option<usize>) = match res.body {
        ResponseBody::Empty => (Box::new(io::empty()), Some(0)),
        ResponseBody::Text(text) => {
            let len = text.len();
            (Box::new(Cursor::new(text.into_bytes())), Some(len))
        }
        ResponseBody::Json(command) => {
            let bytes = command.to_bytes();
            let len = bytes.len();
            (Box::new(Cursor::new(bytes)), Some(len))
        }
        ResponseBody::Stream(stream) => (stream, None),
    };

    tiny_http::Response::new(status, headers, body, length, None)
}
