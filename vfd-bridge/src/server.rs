//! Unix-socket bridge server
//!
//! One listener accepts clients; every connection runs its own receive
//! loop so a slow client never blocks the others. Connections only decode -
//! application happens on the session writer thread at the other end of the
//! command channel. Any single connection failing leaves the accept loop
//! and the remaining connections untouched.

use std::io;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use vfd_protocol::{decode_message, Command};

/// Serve until ctrl-c, then abort the remaining connections
pub async fn run(listener: UnixListener, commands: mpsc::Sender<Command>) -> io::Result<()> {
    let mut connections = JoinSet::new();
    let mut next_id: u64 = 0;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("ctrl-c handler failed: {e}");
                }
                info!("shutdown requested");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        next_id += 1;
                        connections.spawn(serve_connection(next_id, stream, commands.clone()));
                    }
                    Err(e) => warn!("accept failed: {e}"),
                }
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    connections.shutdown().await;
    Ok(())
}

/// Receive loop for one client
///
/// Accumulates bytes to each newline, strips surrounding whitespace, decodes
/// and enqueues. Decode failures drop the message and keep the connection;
/// socket errors and EOF end it.
pub async fn serve_connection(id: u64, stream: UnixStream, commands: mpsc::Sender<Command>) {
    debug!(id, "client connected");
    let mut reader = BufReader::new(stream);
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => break,
            Ok(_) => {
                let message = buffer.trim_ascii();
                if message.is_empty() {
                    continue;
                }
                match decode_message(message) {
                    Ok(command) => {
                        if commands.send(command).await.is_err() {
                            // Session is gone; nothing left to serve
                            break;
                        }
                    }
                    Err(e) => warn!(id, "dropping message: {e}"),
                }
            }
            Err(e) => {
                warn!(id, "read failed: {e}");
                break;
            }
        }
    }
    debug!(id, "client disconnected");
}
