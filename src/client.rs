//! # Pooled Client API
//!
//! Purpose: Expose a compact, blocking API for issuing store commands,
//! hiding session pooling and wire details behind typed calls.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `Client` hides acquire/execute/release; each
//!    call is one command on one pooled session.
//! 2. **Borrow-Friendly API**: Accept `&[u8]` to avoid unnecessary copies.
//! 3. **Typed Errors**: Callers can branch on "the store rejected my
//!    command" vs "the channel broke" without string matching.
//! 4. **Deterministic Wire Output**: Multi-valued commands take ordered
//!    pairs, so the same call always produces the same line.

use std::io;

use thiserror::Error;

use crate::pool::Pool;
use crate::resp::Reply;

/// Result type for all client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Dial, read, or write failure on the transport.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    /// Malformed framing on the reply stream.
    #[error("protocol error: {0}")]
    Protocol(&'static str),
    /// The store rejected the command; carries the server's message.
    #[error("server error: {}", String::from_utf8_lossy(.message))]
    Server { message: Vec<u8> },
    /// A well-formed reply arrived whose type does not fit the command.
    #[error("unexpected reply type")]
    UnexpectedReply,
    /// A command was issued while no transport session was open.
    #[error("connection is not open")]
    NotConnected,
}

/// Configuration shared by the client, its pool, and its sessions.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Store address as `host:port`.
    pub addr: String,
    /// Credential for the AUTH handshake; `None` skips AUTH.
    pub password: Option<String>,
    /// Namespace index selected at handshake; 0 skips SELECT.
    pub db: u32,
    /// Number of sessions the pool holds.
    pub pool_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            addr: "127.0.0.1:6379".to_string(),
            password: None,
            db: 0,
            pool_size: 10,
        }
    }
}

/// Blocking client with session pooling.
///
/// Each command acquires a session from the pool, runs one round trip,
/// and returns the session on drop of the internal guard.
pub struct Client {
    pool: Pool,
}

impl Client {
    /// Creates a client for `addr` with default configuration.
    ///
    /// No I/O happens here; sessions are dialed on first use.
    pub fn new(addr: impl Into<String>) -> Self {
        let config = ClientConfig {
            addr: addr.into(),
            ..ClientConfig::default()
        };
        Self::with_config(config)
    }

    /// Creates a client with a custom configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        Client {
            pool: Pool::new(config),
        }
    }

    /// Runs a raw command for which no wrapper exists.
    pub fn execute(&self, verb: &str, args: &[&[u8]]) -> ClientResult<Reply> {
        let mut conn = self.pool.acquire()?;
        conn.execute(verb, args)
    }

    /// Sets a value for a key.
    pub fn set(&self, key: &[u8], value: &[u8]) -> ClientResult<()> {
        let mut conn = self.pool.acquire()?;
        match conn.execute("SET", &[key, value])? {
            Reply::Simple(_) => Ok(()),
            Reply::Error(message) => Err(ClientError::Server { message }),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// Fetches a value by key. Returns `Ok(None)` when the key is missing.
    pub fn get(&self, key: &[u8]) -> ClientResult<Option<Vec<u8>>> {
        let mut conn = self.pool.acquire()?;
        match conn.execute("GET", &[key])? {
            Reply::Bulk(data) => Ok(data),
            Reply::Error(message) => Err(ClientError::Server { message }),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// Lists keys matching a glob pattern.
    pub fn keys(&self, pattern: &[u8]) -> ClientResult<Vec<Vec<u8>>> {
        let mut conn = self.pool.acquire()?;
        match conn.execute("KEYS", &[pattern])? {
            Reply::Array(Some(items)) => bulk_items(items),
            Reply::Array(None) => Ok(Vec::new()),
            Reply::Error(message) => Err(ClientError::Server { message }),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// Sets several hash fields at once.
    ///
    /// Pairs are written to the wire in the order given, so output is
    /// deterministic and testable.
    pub fn hmset(&self, key: &[u8], pairs: &[(&[u8], &[u8])]) -> ClientResult<()> {
        let mut args: Vec<&[u8]> = Vec::with_capacity(1 + pairs.len() * 2);
        args.push(key);
        for (field, value) in pairs {
            args.push(field);
            args.push(value);
        }

        let mut conn = self.pool.acquire()?;
        match conn.execute("HMSET", &args)? {
            Reply::Simple(_) => Ok(()),
            Reply::Error(message) => Err(ClientError::Server { message }),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// Fetches several hash fields at once.
    ///
    /// Missing fields come back as `None` at their original position.
    pub fn hmget(&self, key: &[u8], fields: &[&[u8]]) -> ClientResult<Vec<Option<Vec<u8>>>> {
        let mut args: Vec<&[u8]> = Vec::with_capacity(1 + fields.len());
        args.push(key);
        args.extend_from_slice(fields);

        let mut conn = self.pool.acquire()?;
        match conn.execute("HMGET", &args)? {
            Reply::Array(Some(items)) => items
                .into_iter()
                .map(|item| match item {
                    Reply::Bulk(data) => Ok(data),
                    _ => Err(ClientError::UnexpectedReply),
                })
                .collect(),
            Reply::Error(message) => Err(ClientError::Server { message }),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// Adds members to a set. Returns how many were newly added.
    pub fn sadd(&self, key: &[u8], members: &[&[u8]]) -> ClientResult<i64> {
        let mut args: Vec<&[u8]> = Vec::with_capacity(1 + members.len());
        args.push(key);
        args.extend_from_slice(members);

        let mut conn = self.pool.acquire()?;
        match conn.execute("SADD", &args)? {
            Reply::Integer(count) => Ok(count),
            Reply::Error(message) => Err(ClientError::Server { message }),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// Lists all members of a set.
    pub fn smembers(&self, key: &[u8]) -> ClientResult<Vec<Vec<u8>>> {
        let mut conn = self.pool.acquire()?;
        match conn.execute("SMEMBERS", &[key])? {
            Reply::Array(Some(items)) => bulk_items(items),
            Reply::Array(None) => Ok(Vec::new()),
            Reply::Error(message) => Err(ClientError::Server { message }),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// The pool backing this client, for direct session access.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

fn bulk_items(items: Vec<Reply>) -> ClientResult<Vec<Vec<u8>>> {
    items
        .into_iter()
        .map(|item| match item {
            Reply::Bulk(Some(data)) => Ok(data),
            _ => Err(ClientError::UnexpectedReply),
        })
        .collect()
}
