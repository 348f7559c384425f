//! Reload channel: a Unix datagram socket carrying curve specifications
//!
//! One datagram is one complete request. There is no reply.

use std::io;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest accepted payload (64 KiB - 1)
pub const MAX_MESSAGE_SIZE: usize = 65535;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Cannot bind reload socket {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot receive reload request: {0}")]
    Receive(#[from] io::Error),

    /// `len` is what was read, at most one byte past the limit
    #[error("Dropped reload request larger than {} bytes", MAX_MESSAGE_SIZE)]
    Oversized { len: usize },
}

/// Receiving end of the reload channel
pub struct ReloadChannel {
    socket: UnixDatagram,

    /// Socket file owned by this channel, removed on drop
    path: Option<PathBuf>,

    /// One byte past the limit, so an oversized datagram is detectable
    buffer: Vec<u8>,
}

impl ReloadChannel {
    /// Bind a socket at `path`, replacing a stale socket file
    pub fn bind(path: impl AsRef<Path>) -> Result<Self, ChannelError> {
        let path = path.as_ref().to_path_buf();

        // Left behind by a previous run; a missing file is fine
        let _ = std::fs::remove_file(&path);

        let socket = UnixDatagram::bind(&path).map_err(|source| ChannelError::Bind {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            socket,
            path: Some(path),
            buffer: vec![0; MAX_MESSAGE_SIZE + 1],
        })
    }

    /// Use an already bound or connected socket
    pub fn from_socket(socket: UnixDatagram) -> Self {
        Self {
            socket,
            path: None,
            buffer: vec![0; MAX_MESSAGE_SIZE + 1],
        }
    }

    /// Block until the next request arrives and return its text
    ///
    /// A datagram over [`MAX_MESSAGE_SIZE`] is discarded whole rather than
    /// parsed truncated.
    pub fn recv_request(&mut self) -> Result<String, ChannelError> {
        let len = self.socket.recv(&mut self.buffer)?;
        if len > MAX_MESSAGE_SIZE {
            return Err(ChannelError::Oversized { len });
        }
        Ok(decode_payload(&self.buffer[..len]))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for ReloadChannel {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Request text of a datagram: everything before the first NUL byte
///
/// Invalid UTF-8 is replaced rather than rejected; it cannot form a number
/// and fails to parse later.
pub fn decode_payload(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Send `spec` to an equalizer listening at `path`
pub fn send_spec(path: impl AsRef<Path>, spec: &str) -> io::Result<usize> {
    if spec.len() > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "specification is {} bytes, limit is {}",
                spec.len(),
                MAX_MESSAGE_SIZE
            ),
        ));
    }
    let socket = UnixDatagram::unbound()?;
    socket.send_to(spec.as_bytes(), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload_stops_at_nul() {
        assert_eq!(decode_payload(b"1000 1.0\0garbage"), "1000 1.0");
        assert_eq!(decode_payload(b"1000 1.0"), "1000 1.0");
        assert_eq!(decode_payload(b""), "");
        assert_eq!(decode_payload(b"\0"), "");
    }

    #[test]
    fn test_decode_payload_replaces_invalid_utf8() {
        let text = decode_payload(&[b'1', 0xff, b' ', b'2']);
        assert!(text.starts_with('1'));
        assert!(text.ends_with(" 2"));
    }

    #[test]
    fn test_receive_from_pair() {
        let (client, server) = UnixDatagram::pair().unwrap();
        let mut channel = ReloadChannel::from_socket(server);

        client.send(b"100 2.0 200 1.0").unwrap();
        client.send(b"").unwrap();

        assert_eq!(channel.recv_request().unwrap(), "100 2.0 200 1.0");
        assert_eq!(channel.recv_request().unwrap(), "");
        assert!(channel.path().is_none());
    }

    /// Valid curve of exactly `len` bytes: padding sits between two pairs
    fn padded_spec(len: usize) -> String {
        let head = "1000 1.0";
        let tail = "20000 0.75";
        let padding = " ".repeat(len - head.len() - tail.len());
        format!("{}{}{}", head, padding, tail)
    }

    #[test]
    fn test_receive_accepts_largest_request() {
        let (client, server) = UnixDatagram::pair().unwrap();
        let mut channel = ReloadChannel::from_socket(server);

        let spec = padded_spec(MAX_MESSAGE_SIZE);
        assert_eq!(client.send(spec.as_bytes()).unwrap(), MAX_MESSAGE_SIZE);

        let received = channel.recv_request().unwrap();
        assert_eq!(received.len(), MAX_MESSAGE_SIZE);
        assert!(received.ends_with("20000 0.75"));
    }

    #[test]
    fn test_receive_drops_oversized_request() {
        let (client, server) = UnixDatagram::pair().unwrap();
        let mut channel = ReloadChannel::from_socket(server);

        // Truncated at the limit this would read "20000 0.7"
        let spec = padded_spec(MAX_MESSAGE_SIZE + 1);
        client.send(spec.as_bytes()).unwrap();
        client.send(b"500 0.5").unwrap();

        assert!(matches!(
            channel.recv_request(),
            Err(ChannelError::Oversized { len }) if len == MAX_MESSAGE_SIZE + 1
        ));

        // Next request is unaffected
        assert_eq!(channel.recv_request().unwrap(), "500 0.5");
    }

    #[test]
    fn test_bind_send_and_cleanup() {
        let path = std::env::temp_dir()
            .join(format!("equalizer-test-{}.socket", std::process::id()));

        // Stale socket file from a previous run
        drop(UnixDatagram::bind(&path).unwrap());
        assert!(path.exists());

        {
            let mut channel = ReloadChannel::bind(&path).unwrap();
            assert_eq!(channel.path(), Some(path.as_path()));

            send_spec(&path, "500 0.5").unwrap();
            assert_eq!(channel.recv_request().unwrap(), "500 0.5");
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_send_rejects_oversized_spec() {
        let spec = "1".repeat(MAX_MESSAGE_SIZE + 1);
        let err = send_spec("/nonexistent/equalizer.socket", &spec).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
