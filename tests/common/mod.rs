#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use action_router::context::current_request;
use action_router::dispatcher::{HandlerRequest, MethodTable, RequestHandler};
use action_router::server::{HttpResponse, RouteResponse};
use serde_json::{json, Value};

pub mod fixtures {
    use std::fs;
    use std::path::Path;

    /// A throwaway web root laid out like a small site.
    pub fn web_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", "<h1>Welcome</h1>\n");
        write(dir.path(), "style.css", "body { margin: 0; }\n");
        write(dir.path(), "js/app.js", "console.log('app');\n");
        write(dir.path(), "img/LOGO.PNG", "\u{89}PNG");
        write(dir.path(), "notes", "no extension\n");
        write(dir.path(), "WEB-INF/secrets.txt", "db.password=hunter2\n");
        fs::create_dir_all(dir.path().join("assets.css")).unwrap();
        dir
    }

    pub fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{Shutdown, SocketAddr, TcpStream};
    use std::time::Duration;

    /// Parsed HTTP/1.1 response.
    #[derive(Debug)]
    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    /// Send `GET path` with extra header lines and read the whole response.
    pub fn get(addr: SocketAddr, path: &str, headers: &[(&str, &str)]) -> RawResponse {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
        for (name, value) in headers {
            request.push_str(&format!("{name}: {value}\r\n"));
        }
        request.push_str("\r\n");
        stream.write_all(request.as_bytes()).unwrap();
        stream.shutdown(Shutdown::Write).ok();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).unwrap();
        parse(&raw)
    }

    fn parse(raw: &[u8]) -> RawResponse {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has a header block");
        let head = String::from_utf8_lossy(&raw[..split]);
        let mut lines = head.split("\r\n");
        let status = lines
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse().ok())
            .expect("status line");
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        let body = &raw[split + 4..];
        let chunked = headers
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case("transfer-encoding") && v.eq_ignore_ascii_case("chunked"));
        let body = if chunked { dechunk(body) } else { body.to_vec() };
        RawResponse { status, headers, body }
    }

    fn dechunk(mut data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let Some(eol) = data.windows(2).position(|w| w == b"\r\n") else {
                break;
            };
            let size_line = String::from_utf8_lossy(&data[..eol]);
            let size = usize::from_str_radix(size_line.split(';').next().unwrap_or("0").trim(), 16)
                .unwrap_or(0);
            if size == 0 {
                break;
            }
            let start = eol + 2;
            out.extend_from_slice(&data[start..start + size]);
            data = &data[start + size + 2..];
        }
        out
    }
}

/// Handler used across the integration tests.
#[derive(Default)]
pub struct UserHandler {
    pub logins: AtomicUsize,
}

impl UserHandler {
    fn login(&self, req: &HandlerRequest<'_>, res: &mut dyn HttpResponse) -> anyhow::Result<()> {
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        res.set_data_by_json(&json!({
            "method": req.route.method_start,
            "params": req.params(),
            "logins": n,
        }));
        Ok(())
    }

    fn whoami(&self, req: &HandlerRequest<'_>, res: &mut dyn HttpResponse) -> anyhow::Result<()> {
        let current = current_request().ok_or_else(|| anyhow::anyhow!("no current request"))?;
        res.set_data_by_json(&json!({
            "path": current.path,
            "same_id": current.request_id == req.request_id,
        }));
        Ok(())
    }

    fn broken(&self, _req: &HandlerRequest<'_>, _res: &mut dyn HttpResponse) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("database unavailable")).map_err(|e| e.context("loading user"))
    }

    fn explode(&self, _req: &HandlerRequest<'_>, _res: &mut dyn HttpResponse) -> anyhow::Result<()> {
        panic!("user table corrupted")
    }
}

impl RequestHandler for UserHandler {
    fn register_methods(table: &mut MethodTable<Self>) {
        table
            .method("login", Self::login)
            .method("index", Self::login)
            .method("whoami", Self::whoami)
            .method("broken", Self::broken)
            .method("explode", Self::explode);
    }
}

/// Body of an in-memory response as JSON.
pub fn json_body(res: RouteResponse) -> Value {
    serde_json::from_slice(&res.into_bytes().unwrap()).unwrap()
}
