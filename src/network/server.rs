//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::collections::HashMap;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use crate::broker::Broker;
use crate::config::Config;
use crate::error::Result;

use super::Connection;

/// How long the accept loop sleeps between shutdown checks
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// TCP server for kraftlog
///
/// ## Concurrency:
/// - One acceptor (the thread calling `run()`)
/// - One worker thread per connection, at most `max_connections` at once
/// - `shutdown()` may be called from any thread
pub struct Server {
    config: Config,
    broker: Arc<Broker>,
    listener: TcpListener,

    /// Set once by `shutdown()`, polled by the accept loop
    shutdown: AtomicBool,

    /// Live connections, shared with the workers
    active: Arc<AtomicUsize>,

    /// Socket handles of live connections, closed on shutdown
    streams: Arc<Mutex<HashMap<u64, TcpStream>>>,

    next_connection_id: AtomicU64,
}

impl Server {
    /// Bind the listen address from `config`
    pub fn new(config: Config, broker: Arc<Broker>) -> Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            broker,
            listener,
            shutdown: AtomicBool::new(false),
            active: Arc::new(AtomicUsize::new(0)),
            streams: Arc::new(Mutex::new(HashMap::new())),
            next_connection_id: AtomicU64::new(1),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Start the server (blocking)
    ///
    /// Returns after `shutdown()` once every worker has finished.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);
        let workers = WaitGroup::new();

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = self.spawn_worker(stream, addr, workers.clone()) {
                        tracing::warn!("Failed to start worker for {}: {}", addr, e);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Error accepting connection: {}", e);
                }
            }
        }

        tracing::info!("Shutting down, closing {} connections", self.active_connections());
        for stream in self.streams.lock().values() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        workers.wait();
        tracing::info!("Server stopped");
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn spawn_worker(&self, stream: TcpStream, addr: SocketAddr, done: WaitGroup) -> Result<()> {
        if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
            tracing::warn!(
                "Rejecting {}: {} connections already open",
                addr,
                self.config.max_connections
            );
            return Ok(());
        }

        // Accepted sockets inherit non-blocking mode from the listener
        stream.set_nonblocking(false)?;

        let id = self.next_connection_id.fetch_add(1, Ordering::SeqCst);
        self.streams.lock().insert(id, stream.try_clone()?);
        self.active.fetch_add(1, Ordering::SeqCst);

        let guard = ConnectionGuard {
            id,
            active: Arc::clone(&self.active),
            streams: Arc::clone(&self.streams),
        };
        let broker = Arc::clone(&self.broker);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let spawned = thread::Builder::new()
            .name(format!("kraftlog-conn-{}", id))
            .spawn(move || {
                let _guard = guard;
                let _done = done;

                let result = Connection::new(stream, broker).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });
                if let Err(e) = result {
                    tracing::debug!("Connection {} from {} ended: {}", id, addr, e);
                }
            });

        // On failure the closure (and the guard in it) is dropped, releasing the slot
        spawned?;
        Ok(())
    }
}

/// Releases a connection slot when its worker exits
struct ConnectionGuard {
    id: u64,
    active: Arc<AtomicUsize>,
    streams: Arc<Mutex<HashMap<u64, TcpStream>>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.streams.lock().remove(&self.id);
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
