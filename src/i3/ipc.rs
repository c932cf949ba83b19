//! i3 IPC wire codec and socket discovery.
//!
//! # Wire format
//!
//! Every message, in both directions, is a fixed 14-byte header followed
//! by a JSON payload:
//!
//! | Bytes  | Content                                   |
//! |--------|-------------------------------------------|
//! | 0..6   | magic string `i3-ipc`                     |
//! | 6..10  | payload length, `u32`, native byte order  |
//! | 10..14 | message type, `u32`, native byte order    |
//!
//! Replies carry the type of the request they answer.  Events pushed after
//! a `SUBSCRIBE` have the high bit set in their type.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAGIC: &[u8; 6] = b"i3-ipc";
const HEADER_LEN: usize = 14;
/// Upper bound on a payload we are willing to buffer.
const MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// Set in the type of every event message.
pub const EVENT_FLAG: u32 = 1 << 31;
/// Event type (without [`EVENT_FLAG`]) of workspace events.
pub const EVENT_WORKSPACE: u32 = 0;
/// Event type (without [`EVENT_FLAG`]) of output events.
pub const EVENT_OUTPUT: u32 = 1;

/// Request types used by i3dist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    RunCommand,
    GetWorkspaces,
    Subscribe,
    GetOutputs,
}

impl MessageType {
    /// Numeric type as sent on the wire.
    pub fn code(self) -> u32 {
        match self {
            MessageType::RunCommand => 0,
            MessageType::GetWorkspaces => 1,
            MessageType::Subscribe => 2,
            MessageType::GetOutputs => 3,
        }
    }
}

/// A decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Raw type, including [`EVENT_FLAG`] for events.
    pub kind: u32,
    pub payload: Vec<u8>,
}

impl Message {
    /// Whether this message is an event rather than a reply.
    pub fn is_event(&self) -> bool {
        self.kind & EVENT_FLAG != 0
    }
}

/// Errors that can occur when talking to i3 or sway.
#[derive(Debug, thiserror::Error)]
pub enum I3Error {
    #[error("no IPC socket: neither I3SOCK nor SWAYSOCK is set")]
    NoSocket,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("command rejected: {0}")]
    Command(String),
}

/// Resolve the IPC socket path.
///
/// `explicit` wins; otherwise `$I3SOCK`, then `$SWAYSOCK`.
pub fn socket_path(explicit: Option<&Path>) -> Result<PathBuf, I3Error> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    ["I3SOCK", "SWAYSOCK"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .find(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(I3Error::NoSocket)
}

/// Connect to the socket at `path`, applying `timeout` to reads and writes.
pub fn connect(path: &Path, timeout: Option<Duration>) -> Result<UnixStream, I3Error> {
    let stream = UnixStream::connect(path)?;
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;
    Ok(stream)
}

/// Encode and send one message.
pub fn write_message<W: Write>(
    writer: &mut W,
    kind: u32,
    payload: &[u8],
) -> Result<(), I3Error> {
    let len = u32::try_from(payload.len())
        .map_err(|_| I3Error::Protocol(format!("payload too large: {} bytes", payload.len())))?;
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&len.to_ne_bytes());
    buf.extend_from_slice(&kind.to_ne_bytes());
    buf.extend_from_slice(payload);
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

/// Read and decode one message.
pub fn read_message<R: Read>(reader: &mut R) -> Result<Message, I3Error> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    if &header[..6] != MAGIC {
        return Err(I3Error::Protocol(format!(
            "bad magic: {:?}",
            String::from_utf8_lossy(&header[..6])
        )));
    }
    let len = u32::from_ne_bytes([header[6], header[7], header[8], header[9]]) as usize;
    let kind = u32::from_ne_bytes([header[10], header[11], header[12], header[13]]);
    if len > MAX_PAYLOAD {
        return Err(I3Error::Protocol(format!("payload too large: {} bytes", len)));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(Message { kind, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_layout() {
        let mut buf = Vec::new();
        write_message(&mut buf, MessageType::GetOutputs.code(), b"").unwrap();
        assert_eq!(buf.len(), HEADER_LEN);
        assert_eq!(&buf[..6], b"i3-ipc");
        assert_eq!(&buf[6..10], &0u32.to_ne_bytes());
        assert_eq!(&buf[10..14], &3u32.to_ne_bytes());
    }

    #[test]
    fn decodes_back_to_back_messages() {
        let mut buf = Vec::new();
        write_message(&mut buf, 0, br#"[{"success":true}]"#).unwrap();
        write_message(&mut buf, EVENT_FLAG | EVENT_OUTPUT, br#"{"change":"unspecified"}"#).unwrap();

        let mut cursor = Cursor::new(buf);
        let reply = read_message(&mut cursor).unwrap();
        assert!(!reply.is_event());
        assert_eq!(reply.payload, br#"[{"success":true}]"#);

        let event = read_message(&mut cursor).unwrap();
        assert!(event.is_event());
        assert_eq!(event.kind & !EVENT_FLAG, EVENT_OUTPUT);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = b"i4-ipc".to_vec();
        buf.extend_from_slice(&[0u8; 8]);
        let err = read_message(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, I3Error::Protocol(_)));
    }

    #[test]
    fn truncated_payload_is_an_io_error() {
        let mut buf = Vec::new();
        write_message(&mut buf, 1, b"[1,2,3]").unwrap();
        buf.truncate(buf.len() - 2);
        let err = read_message(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, I3Error::Io(_)));
    }

    #[test]
    fn explicit_socket_path_wins() {
        let path = socket_path(Some(Path::new("/tmp/explicit.sock"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/explicit.sock"));
    }
}
