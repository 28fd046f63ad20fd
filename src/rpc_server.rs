//! marksync RPC Server — JSON-RPC over stdin/stdout for host integration.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"title":"...","url":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! The host owns the rendered UI and, with a remote backend, the vendor's
//! realtime connection; delivered feed events come back in through the
//! `feed.push` method.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use tokio::sync::Mutex;

use marksync::app::App;
use marksync::rpc_handler::handle_method;
use marksync::services::config::SyncConfig;

use serde_json::{json, Value};

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn main() {
    // Protocol output goes to stdout; logs must stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = match SyncConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let runtime = tokio::runtime::Runtime::new().expect("Failed to start async runtime");
    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("failed to initialize marksync: {}", e);
            std::process::exit(1);
        }
    };
    let backend = app.backend_kind();
    let app = Mutex::new(app);

    // Signal ready
    let ready = json!({"event":"ready","version":env!("CARGO_PKG_VERSION"),"backend":backend});
    println!("{}", ready);
    io::stdout().flush().unwrap();

    // Rate limiting — max 200 RPC requests per second to prevent DoS
    let mut rate_limiter = RateLimiter::new(200);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() { continue; }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let err = json!({"id":null,"error":format!("parse error: {}",e)});
                println!("{}", err);
                io::stdout().flush().unwrap();
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        // Check rate limit before processing
        if !rate_limiter.check() {
            let response = json!({"id": id, "error": "rate limit exceeded"});
            println!("{}", response);
            io::stdout().flush().unwrap();
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let result = runtime.block_on(handle_method(&app, method, &params));

        let response = match result {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        println!("{}", response);
        io::stdout().flush().unwrap();
    }

    // Detach subscriptions while the runtime is still alive.
    runtime.block_on(async {
        app.lock().await.stop_session();
    });
}
