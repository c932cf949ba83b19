//! Unix-socket [`CommandSource`] implementation.
//!
//! Binds a Unix stream socket and serves one connection at a time.  Each
//! line received is parsed as a JSON-encoded [`Command`].
//!
//! # Wire format
//!
//! ```json
//! "Redistribute"
//! {"SwitchTo":3}
//! {"MoveContainerTo":4}
//! ```
//!
//! For example: `echo '"Redistribute"' | socat - UNIX-CONNECT:$XDG_RUNTIME_DIR/i3dist.sock`.

use crate::command::Command;
use crate::traits::CommandSource;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

/// A [`CommandSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UnixSocketListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](CommandSource::run) is called.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse one line.  Blank lines yield `Ok(None)`.
fn parse_line(line: &str) -> Result<Option<Command>, UnixSocketError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// Forward every command from one client.  Returns `false` once the sink
/// is closed.
fn serve(stream: UnixStream, sink: &Sender<Command>) -> bool {
    for line in BufReader::new(stream).lines() {
        let text = match line {
            Ok(text) => text,
            Err(e) => {
                warn!("read error: {}", e);
                break;
            }
        };
        match parse_line(&text) {
            Ok(None) => {}
            Ok(Some(cmd)) => {
                debug!("received {:?}", cmd);
                if sink.send(cmd).is_err() {
                    return false;
                }
            }
            Err(e) => warn!("bad command {:?}: {}", text, e),
        }
    }
    true
}

impl CommandSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// Blocks until the sink is closed; the socket file is removed on the
    /// way out.
    fn run(&mut self, sink: Sender<Command>) -> Result<(), Self::Error> {
        // A previous instance may have left its socket behind.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("control socket listening on {}", self.path.display());

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    debug!("client connected");
                    if !serve(stream, &sink) {
                        info!("sink closed, shutting down");
                        break;
                    }
                    debug!("client disconnected");
                }
                Err(e) => error!("accept error: {}", e),
            }
        }

        let _ = std::fs::remove_file(&self.path);
        Ok(())
    }
}

//  Tests
