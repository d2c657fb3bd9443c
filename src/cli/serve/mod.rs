//! Live page server.
//!
//! ```text
//! /watch/:page  SSE stream of document updates (own thread)
//! /edit/:page   page with the editor assets injected
//! /quiz         scripted SSE demo (own thread)
//! /page/*       files from the page directory
//! ```
//!
//! Short requests run on a small rayon pool. Streams stay open until the
//! viewer leaves, so each gets a dedicated thread instead of a pool slot.

mod lifecycle;
mod path;
mod response;
mod route;

use crate::{
    actor::{Coordinator, EngineHandle},
    config::{LiveConfig, cfg},
    core::{DocumentName, is_shutdown},
    debug,
    document::{FsStore, PageStore},
    log,
    stream::{Connection, Signals, demo},
};
use anyhow::{Context, Result};
use crossbeam::channel;
use route::Route;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Request, Server};

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server and register it for Ctrl+C.
pub fn bind_server() -> Result<BoundServer> {
    let config = cfg();
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);
    debug!("serve"; "config {}", config.config_path.display());

    Ok(BoundServer {
        server,
        addr,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Start the actors, then the request loop (blocking).
    pub fn run(self) -> Result<()> {
        let config = cfg();
        let store: Arc<dyn PageStore> = Arc::new(FsStore::new(config.pages_dir()));

        let mut coordinator = Coordinator::new(store).with_shutdown_signal(self.shutdown_rx);
        if config.watch.enabled {
            log!("watch"; "{}", config.pages_dir().display());
            coordinator =
                coordinator.with_watch(config.pages_dir().to_path_buf(), config.watch.debounce());
        }
        let running = coordinator.start()?;
        debug!("serve"; "engine ready, accepting requests on {}", self.addr);

        let result = run_request_loop(&self.server, &running.handle);
        running.handle.shutdown();
        lifecycle::wait_for_shutdown(running.thread);
        result
    }
}

fn run_request_loop(server: &Server, engine: &EngineHandle) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .thread_name(|i| format!("livepage-http-{i}"))
        .build()
        .context("failed to create thread pool")?;

    for request in server.incoming_requests() {
        let config = cfg();
        let engine = engine.clone();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config, &engine) {
                log!("serve"; "request error: {e:#}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, config: &LiveConfig, engine: &EngineHandle) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    let routed = match route::route(request.method(), request.url()) {
        Ok(routed) => routed,
        Err(e) => return response::respond_error(request, &e),
    };

    match routed {
        Route::Watch(name) => open_watch(request, name, engine, config.serve.heartbeat()),
        Route::Edit(name) => match engine.edit_page(name) {
            Ok(page) => response::respond_html(request, page),
            Err(e) => response::respond_error(request, &e),
        },
        Route::Quiz { query, from_body } => open_quiz(request, &query, from_body),
        Route::Page(rest) => match path::resolve_path(&rest, config.pages_dir()) {
            Some(path) => response::respond_file(request, &path),
            None => response::respond_not_found(request),
        },
        Route::MethodNotAllowed(allow) => response::respond_method_not_allowed(request, allow),
        Route::NotFound => response::respond_not_found(request),
    }
}

/// Subscribe, then hand the connection to its own thread.
///
/// Errors before the subscription exists get a plain HTTP status; after that
/// the response is already a stream and failures only close it.
fn open_watch(
    request: Request,
    name: DocumentName,
    engine: &EngineHandle,
    heartbeat: Duration,
) -> Result<()> {
    let mut conn = Connection::new(engine.clone());
    let opened = match engine.open(name.clone()) {
        Ok(opened) => opened,
        Err(e) => return response::respond_error(request, &e),
    };
    conn.start(opened.id)?;
    debug!("sse"; "{} watching {}", opened.id, name);

    spawn_stream(move || {
        let mut out = request.into_writer();
        match conn.pump(&mut out, &opened.rx, heartbeat) {
            Ok(end) => debug!("sse"; "{} {:?}", opened.id, end),
            Err(e) => debug!("sse"; "{} closed: {}", opened.id, e),
        }
    })
}

fn open_quiz(mut request: Request, query: &str, from_body: bool) -> Result<()> {
    let signals = if from_body {
        let mut body = Vec::new();
        request
            .as_reader()
            .read_to_end(&mut body)
            .context("failed to read request body")?;
        Signals::from_body(&body)
    } else {
        Signals::from_query(query)
    };
    let signals = match signals {
        Ok(signals) => signals,
        Err(e) => return response::respond_error(request, &e),
    };

    let steps = demo::quiz(&signals);
    spawn_stream(move || {
        let mut out = request.into_writer();
        match demo::play(&mut out, &steps, thread::sleep) {
            Ok(pushed) => debug!("sse"; "quiz finished after {} pushes", pushed),
            Err(e) => debug!("sse"; "quiz closed: {}", e),
        }
    })
}

fn spawn_stream(body: impl FnOnce() + Send + 'static) -> Result<()> {
    thread::Builder::new()
        .name("livepage-sse".into())
        .spawn(body)
        .context("failed to spawn stream thread")?;
    Ok(())
}
