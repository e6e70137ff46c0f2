//! # LineKV Client
//!
//! Purpose: Provide a lightweight, synchronous client for RESP-style
//! key-value stores that speak inline commands, with session pooling to
//! bound concurrent connections.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: A fixed set of sessions is shared across
//!    threads; callers block for a session instead of dialing ad hoc.
//! 2. **Typed Replies**: Server replies are a tagged union; callers
//!    pattern-match, nothing is downcast at runtime.
//! 3. **Binary-Safe Inline Commands**: Arguments are escaped into
//!    space-free tokens, so raw bytes travel on a single command line.
//! 4. **Minimal Allocation**: Sessions reuse their framing buffers across
//!    round trips.

mod client;
mod conn;
mod escape;
mod pool;
mod resp;

pub use client::{Client, ClientConfig, ClientError, ClientResult};
pub use conn::Connection;
pub use escape::{escape, unescape};
pub use pool::{Pool, PooledConn};
pub use resp::Reply;
