//! In-process release host for exercising lookup and download paths

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::thread;
use tiny_http::{Response, Server, StatusCode};

/// How the stub host answers one path
pub enum StubRoute {
    /// 200 with the given body
    Ok(Vec<u8>),
    /// Fixed status with an empty body
    Status(u16),
    /// 200 that claims `claimed_len` bytes but sends only `body`
    ///
    /// Pair with a client timeout; the connection stays open after the
    /// short body, so the client surfaces the failure as a timed-out read.
    Truncated { body: Vec<u8>, claimed_len: usize },
    /// 500 for the first `failures` requests, then 200 with the body
    FlakyOk { body: Vec<u8>, failures: u32 },
}

/// Minimal release host bound to a random localhost port
pub struct StubServer {
    base_url: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl StubServer {
    pub fn start<S: Into<String>>(routes: Vec<(S, StubRoute)>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind stub server");
        let port = server
            .server_addr()
            .to_ip()
            .expect("stub server ip addr")
            .port();
        let base_url = format!("http://127.0.0.1:{port}");

        let routes: HashMap<String, StubRoute> = routes
            .into_iter()
            .map(|(path, route)| (path.into(), route))
            .collect();
        let hits = Arc::new(Mutex::new(HashMap::new()));
        let hit_counts = Arc::clone(&hits);

        thread::spawn(move || {
            let mut remaining_failures: HashMap<String, u32> = routes
                .iter()
                .filter_map(|(path, route)| match route {
                    StubRoute::FlakyOk { failures, .. } => Some((path.clone(), *failures)),
                    _ => None,
                })
                .collect();

            for request in server.incoming_requests() {
                let path = request.url().to_string();
                *hit_counts.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

                match routes.get(&path) {
                    None => {
                        let _ = request.respond(Response::empty(404));
                    }
                    Some(StubRoute::Ok(body)) => {
                        let _ = request.respond(Response::from_data(body.clone()));
                    }
                    Some(StubRoute::Status(code)) => {
                        let _ = request.respond(Response::empty(*code));
                    }
                    Some(StubRoute::Truncated { body, claimed_len }) => {
                        let response = Response::new(
                            StatusCode(200),
                            Vec::new(),
                            Cursor::new(body.clone()),
                            Some(*claimed_len),
                            None,
                        );
                        let _ = request.respond(response);
                    }
                    Some(StubRoute::FlakyOk { body, .. }) => {
                        let left = remaining_failures
                            .get_mut(&path)
                            .expect("flaky route counter");
                        if *left > 0 {
                            *left -= 1;
                            let _ = request.respond(Response::empty(500));
                        } else {
                            let _ = request.respond(Response::from_data(body.clone()));
                        }
                    }
                }
            }
        });

        Self { base_url, hits }
    }

    /// Absolute URL for a path on the stub host
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Base URL with a trailing slash, usable as a release download base
    pub fn base_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// Requests served for one path
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Requests served across all paths
    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

/// URL on a localhost port that nothing listens on
pub fn unreachable_url(path: &str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let port = listener.local_addr().expect("listener addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}{path}")
}
