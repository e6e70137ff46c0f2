#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use linekv_client::{escape, unescape};

/// Spawns a one-connection mock store that reads `expected` inline
/// commands and lets `handler` write each reply.
pub fn spawn_server(
    expected: usize,
    handler: fn(usize, Vec<Vec<u8>>, &mut TcpStream),
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        for idx in 0..expected {
            let args = read_command(&mut reader).expect("read command");
            handler(idx, args, &mut stream);
        }
    });

    addr
}

/// Spawns a listener that accepts every connection and keeps the sockets
/// open without ever replying. Used by pool tests that only dial.
pub fn spawn_idle_listener() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();

    thread::spawn(move || {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept() {
            held.push(stream);
        }
    });

    addr
}

/// Reads one CRLF-terminated inline command and splits it into unescaped
/// tokens.
pub fn read_command(reader: &mut BufReader<TcpStream>) -> std::io::Result<Vec<Vec<u8>>> {
    let mut line = Vec::new();
    let bytes = reader.read_until(b'\n', &mut line)?;
    if bytes == 0 {
        return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof"));
    }
    if line.len() < 2 || line[line.len() - 2] != b'\r' {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "invalid line",
        ));
    }
    line.truncate(line.len() - 2);
    Ok(line.split(|&b| b == b' ').map(unescape).collect())
}

pub fn write_simple(stream: &mut TcpStream, msg: &str) {
    let _ = stream.write_all(b"+");
    let _ = stream.write_all(msg.as_bytes());
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

pub fn write_error(stream: &mut TcpStream, msg: &str) {
    let _ = stream.write_all(b"-");
    let _ = stream.write_all(msg.as_bytes());
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

pub fn write_integer(stream: &mut TcpStream, value: i64) {
    let _ = stream.write_all(b":");
    let _ = stream.write_all(value.to_string().as_bytes());
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

/// Writes a bulk reply the way a compatible store does: the stored token
/// is the escaped payload, and the declared length covers the escaped
/// bytes.
pub fn write_bulk(stream: &mut TcpStream, data: &[u8]) {
    let token = escape(data);
    let _ = stream.write_all(b"$");
    let _ = stream.write_all(token.len().to_string().as_bytes());
    let _ = stream.write_all(b"\r\n");
    let _ = stream.write_all(&token);
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

pub fn write_nil(stream: &mut TcpStream) {
    let _ = stream.write_all(b"$-1\r\n");
    let _ = stream.flush();
}

pub fn write_array_header(stream: &mut TcpStream, count: i64) {
    let _ = stream.write_all(b"*");
    let _ = stream.write_all(count.to_string().as_bytes());
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}
