//! Accepting connections and dispatching them to worker threads.

use core::fmt;
use std::net::SocketAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::{debug, error, info, warn};
use svg2png::{FontCatalog, Pipeline, ResvgRenderer};

use crate::config::Config;
use crate::service::Service;

/// The conversion server.
///
/// All workers pull requests from the same listener, and each of them handles one
/// request at a time from start to finish. A slow conversion therefore only ties up
/// the worker running it.
pub struct Server {
    http: Arc<tiny_http::Server>,
    service: Service,
    workers: usize,
    stopping: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listener.
    ///
    /// The font catalog must be fully initialized at this point, as it is shared
    /// read-only by all workers from here on.
    pub fn bind(config: &Config, fonts: FontCatalog) -> Result<Self, BindError> {
        let http = tiny_http::Server::http(config.listen).map_err(|source| BindError {
            addr: config.listen,
            source,
        })?;

        let renderer = ResvgRenderer::new(fonts, config.render());
        let service = Service::new(
            Pipeline::new(renderer),
            config.decode(),
            config.path.clone(),
        );

        Ok(Self {
            http: Arc::new(http),
            service,
            workers: config.worker_count(),
            stopping: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The address the server is actually listening on.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    /// A handle that can stop the server from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            http: Arc::clone(&self.http),
            workers: self.workers,
            stopping: Arc::clone(&self.stopping),
        }
    }

    /// Serve requests until [`ShutdownHandle::shutdown`] is called.
    pub fn run(self) {
        match self.local_addr() {
            Some(addr) => info!("listening on http://{addr} with {} workers", self.workers),
            None => info!("listening with {} workers", self.workers),
        }

        thread::scope(|scope| {
            for id in 0..self.workers {
                let spawned = thread::Builder::new()
                    .name(format!("svg2png-worker-{id}"))
                    .spawn_scoped(scope, || self.work());

                if let Err(err) = spawned {
                    error!("failed to spawn worker {id}: {err}");
                }
            }
        });

        info!("server stopped");
    }

    fn work(&self) {
        loop {
            match self.http.recv() {
                Ok(request) => {
                    // A panicking conversion drops the request, which answers it with a
                    // bare 500 and leaves the worker alive for the next one.
                    if catch_unwind(AssertUnwindSafe(|| self.service.handle(request))).is_err() {
                        error!("request handler panicked");
                    }
                }
                Err(_) if self.stopping.load(Ordering::SeqCst) => break,
                Err(err) => warn!("failed to receive request: {err}"),
            }
        }

        debug!("worker exiting");
    }
}

/// Stops a running [`Server`].
#[derive(Clone)]
pub struct ShutdownHandle {
    http: Arc<tiny_http::Server>,
    workers: usize,
    stopping: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask all workers to exit once they are done with their current request.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);

        // Every call wakes up a single blocked worker.
        for _ in 0..self.workers {
            self.http.unblock();
        }
    }
}

/// The listener could not be bound.
#[derive(Debug)]
pub struct BindError {
    addr: SocketAddr,
    source: Box<dyn core::error::Error + Send + Sync + 'static>,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to listen on {}: {}", self.addr, self.source)
    }
}

impl core::error::Error for BindError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&*self.source)
    }
}
