//! # Connection
//!
//! Purpose: Own a single TCP session to the store and run one command
//! round trip at a time over it.
//!
//! ## Design Principles
//! 1. **Exclusive Ownership**: A session is used by one caller at a time;
//!    the pool enforces this, the type does not need interior locks.
//! 2. **Lazy Establishment**: Construction is cheap and offline; the
//!    socket is dialed on `connect`, typically from the pool.
//! 3. **Handshake Up Front**: AUTH and SELECT run inside `connect`, so a
//!    connected session is always in its configured namespace.
//! 4. **Buffer Reuse**: Read and write buffers live on the connection to
//!    avoid per-call allocations.

use std::io::{BufReader, Write};
use std::net::TcpStream;

use tracing::{debug, trace};

use crate::client::{ClientConfig, ClientError, ClientResult};
use crate::resp::{encode_command, read_reply, Reply};

/// One client session.
///
/// The transport handle is absent until [`Connection::connect`] succeeds
/// and is dropped again by [`Connection::disconnect`] or by a transport or
/// framing failure inside [`Connection::execute`].
pub struct Connection {
    addr: String,
    password: Option<String>,
    db: u32,
    stream: Option<BufReader<TcpStream>>,
    line_buf: Vec<u8>,
    write_buf: Vec<u8>,
}

impl Connection {
    /// Creates an unconnected session from the shared configuration.
    pub fn new(config: &ClientConfig) -> Self {
        Connection {
            addr: config.addr.clone(),
            password: config.password.clone(),
            db: config.db,
            stream: None,
            line_buf: Vec::with_capacity(128),
            write_buf: Vec::with_capacity(256),
        }
    }

    /// Dials the remote address and runs the AUTH/SELECT handshake.
    ///
    /// A handshake failure, whether an error reply or a transport fault,
    /// aborts the connect and releases the socket.
    pub fn connect(&mut self) -> ClientResult<()> {
        let stream = TcpStream::connect(self.addr.as_str())?;
        // Round trips are small; do not let Nagle batch them.
        stream.set_nodelay(true)?;
        self.stream = Some(BufReader::new(stream));

        if let Err(err) = self.handshake() {
            self.disconnect();
            return Err(err);
        }
        debug!(addr = %self.addr, db = self.db, "session established");
        Ok(())
    }

    fn handshake(&mut self) -> ClientResult<()> {
        if let Some(password) = self.password.clone() {
            self.auth(password.as_bytes())?;
        }
        let db = self.db;
        if db != 0 {
            self.select(db)?;
        }
        Ok(())
    }

    /// Writes one encoded command and decodes exactly one reply.
    ///
    /// Fails with [`ClientError::NotConnected`] when no session is open.
    /// After a transport or protocol failure the handle is dropped, since
    /// the framing state of the stream is no longer known; the session
    /// reconnects on its next acquire. An error reply leaves the session
    /// open.
    pub fn execute(&mut self, verb: &str, args: &[&[u8]]) -> ClientResult<Reply> {
        let result = self.send_recv(verb, args);
        if matches!(
            &result,
            Err(ClientError::Transport(_)) | Err(ClientError::Protocol(_))
        ) {
            self.stream = None;
            debug!(addr = %self.addr, "session dropped after failed round trip");
        }
        result
    }

    fn send_recv(&mut self, verb: &str, args: &[&[u8]]) -> ClientResult<Reply> {
        let Connection {
            stream,
            line_buf,
            write_buf,
            ..
        } = self;
        let reader = stream.as_mut().ok_or(ClientError::NotConnected)?;

        write_buf.clear();
        encode_command(verb, args, write_buf);
        trace!(verb, "command dispatched");

        let transport = reader.get_mut();
        transport.write_all(write_buf)?;
        transport.flush()?;

        read_reply(reader, line_buf)
    }

    /// Authenticates this session.
    pub fn auth(&mut self, password: &[u8]) -> ClientResult<()> {
        match self.execute("AUTH", &[password])? {
            Reply::Simple(_) => Ok(()),
            Reply::Error(message) => Err(ClientError::Server { message }),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// Switches this session to another namespace index.
    ///
    /// Selection is per-session server state; pooled callers configure the
    /// namespace via [`ClientConfig::db`] instead, which every session
    /// applies during its handshake.
    pub fn select(&mut self, db: u32) -> ClientResult<()> {
        let index = db.to_string();
        match self.execute("SELECT", &[index.as_bytes()])? {
            Reply::Simple(_) => Ok(()),
            Reply::Error(message) => Err(ClientError::Server { message }),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// Reports whether a transport handle currently exists.
    ///
    /// This is a liveness heuristic only; the socket is not probed.
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Drops the transport handle, closing the socket.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            debug!(addr = %self.addr, "session closed");
        }
    }
}
