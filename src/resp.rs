//! # Wire Encoding and Reply Parsing
//!
//! Purpose: Encode inline commands and parse typed server replies from a
//! buffered byte stream, keeping allocations under control.
//!
//! ## Design Principles
//! 1. **Typed Replies**: Every reply is a `Reply` variant; consumers
//!    pattern-match instead of downcasting.
//! 2. **Incremental Reads**: Framing is driven by `BufRead`, so replies
//!    larger than one read buffer and partial network reads both work.
//! 3. **Binary-Safe**: Bulk payloads are raw bytes, unescaped on arrival.
//! 4. **Fail Fast**: Malformed framing surfaces a protocol error
//!    immediately; the decoder never guesses.

use std::io::{self, BufRead, Read};

use crate::client::{ClientError, ClientResult};
use crate::escape::{escape_into, unescape};

/// Upper bound for one tag line. Lines this long indicate a peer that is
/// not speaking the protocol.
const MAX_LINE_LEN: usize = 64 * 1024;

/// One decoded server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK` style status line.
    Simple(Vec<u8>),
    /// `-ERR ...` line; the message is everything after the tag.
    Error(Vec<u8>),
    /// `:123` line.
    Integer(i64),
    /// `$n` length-prefixed payload, `None` for the `$-1` sentinel.
    Bulk(Option<Vec<u8>>),
    /// `*n` sequence of nested replies, `None` for the `*-1` sentinel.
    Array(Option<Vec<Reply>>),
}

/// Encodes one inline command into the provided buffer.
///
/// Arguments are escaped independently, joined to the verb with single
/// spaces, and terminated with CRLF. No length limit is enforced here.
pub fn encode_command(verb: &str, args: &[&[u8]], out: &mut Vec<u8>) {
    out.extend_from_slice(verb.as_bytes());
    for arg in args {
        out.push(b' ');
        escape_into(arg, out);
    }
    out.extend_from_slice(b"\r\n");
}

/// Reads exactly one reply from the buffered reader.
///
/// The cursor is left at the first byte of the next reply. `line_buf` is
/// caller-provided scratch space reused across calls.
pub fn read_reply<R: BufRead>(reader: &mut R, line_buf: &mut Vec<u8>) -> ClientResult<Reply> {
    read_line(reader, line_buf)?;
    if line_buf.is_empty() {
        return Err(ClientError::Protocol("empty reply line"));
    }

    match line_buf[0] {
        b'+' => Ok(Reply::Simple(line_buf[1..].to_vec())),
        b'-' => Ok(Reply::Error(line_buf[1..].to_vec())),
        b':' => Ok(Reply::Integer(parse_i64(&line_buf[1..])?)),
        b'$' => {
            let len = parse_i64(&line_buf[1..])?;
            read_bulk(reader, len)
        }
        b'*' => {
            let count = parse_i64(&line_buf[1..])?;
            read_array(reader, count, line_buf)
        }
        _ => Err(ClientError::Protocol("unknown reply tag")),
    }
}

fn read_bulk<R: BufRead>(reader: &mut R, len: i64) -> ClientResult<Reply> {
    if len < 0 {
        return Ok(Reply::Bulk(None));
    }

    let mut data = vec![0u8; len as usize];
    reader.read_exact(&mut data).map_err(truncated_bulk)?;

    let mut crlf = [0u8; 2];
    reader.read_exact(&mut crlf).map_err(truncated_bulk)?;
    if crlf != [b'\r', b'\n'] {
        return Err(ClientError::Protocol("bad bulk terminator"));
    }

    Ok(Reply::Bulk(Some(unescape(&data))))
}

fn read_array<R: BufRead>(
    reader: &mut R,
    count: i64,
    line_buf: &mut Vec<u8>,
) -> ClientResult<Reply> {
    if count < 0 {
        return Ok(Reply::Array(None));
    }

    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(read_reply(reader, line_buf)?);
    }
    Ok(Reply::Array(Some(items)))
}

/// Reads one CRLF-terminated line into `buf`, stripping the terminator.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> ClientResult<()> {
    buf.clear();
    let bytes = reader
        .by_ref()
        .take((MAX_LINE_LEN + 1) as u64)
        .read_until(b'\n', buf)?;
    if bytes == 0 {
        return Err(ClientError::Protocol("unexpected end of stream"));
    }
    if bytes > MAX_LINE_LEN {
        return Err(ClientError::Protocol("reply line too long"));
    }
    if buf.last() != Some(&b'\n') || buf.len() < 2 || buf[buf.len() - 2] != b'\r' {
        return Err(ClientError::Protocol("bad line terminator"));
    }
    buf.truncate(buf.len() - 2);
    Ok(())
}

fn parse_i64(data: &[u8]) -> ClientResult<i64> {
    let (negative, digits) = match data.split_first() {
        Some((&b'-', rest)) => (true, rest),
        _ => (false, data),
    };
    if digits.is_empty() {
        return Err(ClientError::Protocol("invalid integer"));
    }

    let mut value: i64 = 0;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return Err(ClientError::Protocol("invalid integer"));
        }
        value = value
            .saturating_mul(10)
            .saturating_add((byte - b'0') as i64);
    }

    Ok(if negative { -value } else { value })
}

fn truncated_bulk(err: io::Error) -> ClientError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ClientError::Protocol("truncated bulk payload")
    } else {
        ClientError::Transport(err)
    }
}
