//! # Connection Pool
//!
//! Purpose: Multiplex a fixed number of sessions across concurrent
//! callers, handing each caller exclusive use of one session at a time.
//!
//! ## Design Principles
//! 1. **Bounded by Construction**: All sessions are built up front; the
//!    number held out can never exceed capacity.
//! 2. **Blocking Handoff**: `acquire` suspends the calling thread until a
//!    session is available; the queue doubles as a counting semaphore.
//! 3. **Lazy Connects**: Sessions are dialed on first use and redialed
//!    when found inactive, never in the constructor.
//! 4. **Release by Drop**: The guard returns its session on drop, so a
//!    session is released exactly once per acquire.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Condvar, Mutex};

use tracing::{debug, trace};

use crate::client::{ClientConfig, ClientResult};
use crate::conn::Connection;

struct PoolInner {
    idle: Mutex<VecDeque<Connection>>,
    available: Condvar,
    capacity: usize,
}

/// Shared handle to a fixed-capacity session pool.
///
/// Cloning the handle shares the same pool; the pool and its remaining
/// sockets are torn down when the last handle and guard drop.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    /// Builds a pool of `config.pool_size` unconnected sessions.
    ///
    /// Capacity is clamped to at least one. No I/O happens here; sessions
    /// are dialed on first acquire.
    pub fn new(config: ClientConfig) -> Self {
        let capacity = config.pool_size.max(1);
        let idle: VecDeque<Connection> =
            (0..capacity).map(|_| Connection::new(&config)).collect();
        debug!(capacity, addr = %config.addr, "connection pool created");
        Pool {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(idle),
                available: Condvar::new(),
                capacity,
            }),
        }
    }

    /// Blocks until a session is available and hands it out.
    ///
    /// There is no timeout: under sustained capacity exhaustion callers
    /// block indefinitely. An inactive session is connected before it is
    /// handed out; if that connect fails the session goes back into the
    /// queue rather than losing the slot, and the error surfaces to the
    /// caller, who decides whether to retry.
    pub fn acquire(&self) -> ClientResult<PooledConn> {
        let mut conn = self.take_idle();
        if !conn.is_active() {
            trace!("reviving idle session");
            if let Err(err) = conn.connect() {
                self.put_back(conn);
                return Err(err);
            }
        }
        Ok(PooledConn {
            pool: Arc::clone(&self.inner),
            conn: Some(conn),
        })
    }

    /// Disconnects every idle session.
    ///
    /// Intended for teardown once callers have quiesced. Sessions still
    /// held by guards close when their guard and the last pool handle
    /// drop.
    pub fn close(&self) {
        let mut idle = self.inner.idle.lock().expect("pool mutex poisoned");
        for conn in idle.iter_mut() {
            conn.disconnect();
        }
        debug!(capacity = self.inner.capacity, "connection pool closed");
    }

    /// Number of sessions the pool was built with.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    fn take_idle(&self) -> Connection {
        let mut idle = self.inner.idle.lock().expect("pool mutex poisoned");
        loop {
            if let Some(conn) = idle.pop_front() {
                return conn;
            }
            idle = self
                .inner
                .available
                .wait(idle)
                .expect("pool mutex poisoned");
        }
    }

    fn put_back(&self, conn: Connection) {
        let mut idle = self.inner.idle.lock().expect("pool mutex poisoned");
        idle.push_back(conn);
        drop(idle);
        self.inner.available.notify_one();
    }
}

/// Exclusive hold on one pooled session.
///
/// Derefs to [`Connection`]; the session returns to the pool when the
/// guard drops.
pub struct PooledConn {
    pool: Arc<PoolInner>,
    conn: Option<Connection>,
}

impl Deref for PooledConn {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("session present until drop")
    }
}

impl DerefMut for PooledConn {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("session present until drop")
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            // Must not panic in drop; a poisoned lock still takes the
            // session back.
            let mut idle = match self.pool.idle.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            idle.push_back(conn);
            drop(idle);
            self.pool.available.notify_one();
        }
    }
}
