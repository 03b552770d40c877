//! Same-origin image relay server.
//!
//! Routes:
//!
//! - `GET /imageproxy?url=<encoded>` fetches the URL and returns its status,
//!   headers and body unchanged; any fetch error answers 400 with no body.
//! - guarded paths (the server's own sources, `..` segments) answer 403.
//! - anything else is served as a static file under the configured root, or
//!   404 when it does not exist.
//!
//! Each request is handled on its own thread.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use tiny_http::{Header, Request, Response, Server};

use crate::{Error, Result};

const PROXY_PATH: &str = "/imageproxy";

// Set by tiny_http itself or meaningless once the body is buffered.
const SKIPPED_HEADERS: &[&str] = &["content-length", "transfer-encoding", "connection", "keep-alive"];

/// Relay server configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Directory static files are served from
    pub root: PathBuf,
    /// Path prefixes that are never served
    pub guarded_prefixes: Vec<String>,
    /// User agent sent upstream
    pub user_agent: String,
    /// Upstream request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            guarded_prefixes: vec![
                "/src/".to_string(),
                "/Cargo.toml".to_string(),
                "/Cargo.lock".to_string(),
            ],
            user_agent: crate::DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 30000,
        }
    }
}

type Reply = Response<Cursor<Vec<u8>>>;

struct Handler {
    config: RelayConfig,
    client: Client,
}

/// A bound relay server.
pub struct RelayServer {
    server: Arc<Server>,
    handler: Arc<Handler>,
}

impl RelayServer {
    /// Bind to `addr` (e.g. `127.0.0.1:8080`, port 0 picks a free port).
    pub fn bind(addr: &str, config: RelayConfig) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| Error::NetworkError(format!("Failed to bind {}: {}", addr, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            server: Arc::new(server),
            handler: Arc::new(Handler { config, client }),
        })
    }

    /// `http://host:port` of the bound socket.
    pub fn base_url(&self) -> String {
        match self.server.server_addr().to_ip() {
            Some(addr) => format!("http://{}", addr),
            None => String::new(),
        }
    }

    /// Serve requests until the listener fails.
    pub fn serve(&self) {
        log::info!("relay listening on {}", self.base_url());
        for request in self.server.incoming_requests() {
            let handler = Arc::clone(&self.handler);
            std::thread::spawn(move || handler.handle(request));
        }
    }

    /// Serve on a background thread.
    pub fn spawn(self) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || self.serve())
    }
}

impl Handler {
    fn handle(&self, request: Request) {
        let raw = request.url().to_string();
        let reply = match url::Url::parse("http://relay.local").and_then(|base| base.join(&raw)) {
            Ok(parsed) => self.route(&parsed),
            Err(_) => status_only(400),
        };
        if let Err(e) = request.respond(reply) {
            log::warn!("failed to respond to {}: {}", raw, e);
        }
    }

    fn route(&self, url: &url::Url) -> Reply {
        let path = url.path();
        if path == PROXY_PATH {
            let target = url
                .query_pairs()
                .find(|(k, _)| k == "url")
                .map(|(_, v)| v.into_owned());
            return match target {
                Some(target) => self.proxy(&target),
                None => status_only(400),
            };
        }
        if self.is_guarded(path) {
            log::warn!("refused guarded path {}", path);
            return status_only(403);
        }
        self.static_file(path)
    }

    fn is_guarded(&self, path: &str) -> bool {
        path.split('/').any(|segment| segment == "..")
            || self
                .config
                .guarded_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn proxy(&self, target: &str) -> Reply {
        let upstream = match url::Url::parse(target) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => u,
            _ => return status_only(400),
        };

        let resp = match self.client.get(upstream).send() {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("relay fetch of {} failed: {}", target, e);
                return status_only(400);
            }
        };

        let status = resp.status().as_u16();
        let headers: Vec<Header> = resp
            .headers()
            .iter()
            .filter(|(name, _)| !SKIPPED_HEADERS.contains(&name.as_str()))
            .filter_map(|(name, value)| Header::from_bytes(name.as_str().as_bytes(), value.as_bytes()).ok())
            .collect();

        let body = match resp.bytes() {
            Ok(b) => b.to_vec(),
            Err(e) => {
                log::warn!("relay body of {} failed: {}", target, e);
                return status_only(400);
            }
        };

        let mut reply = Response::from_data(body).with_status_code(status);
        for header in headers {
            reply.add_header(header);
        }
        reply
    }

    fn static_file(&self, path: &str) -> Reply {
        log::info!("Requested {}", path);
        let file = self.config.root.join(path.trim_start_matches('/'));
        match std::fs::read(&file) {
            Ok(data) if file.is_file() => Response::from_data(data),
            _ => Response::from_data(b"404 Not found".to_vec()).with_status_code(404),
        }
    }
}

fn status_only(code: u16) -> Reply {
    Response::from_data(Vec::new()).with_status_code(code)
}
