//! Session writer thread
//!
//! Every connection funnels its decoded commands into one bounded channel;
//! this thread is the only writer the display session ever sees, which
//! gives the at-most-one-writer ordering guarantee and keeps blocking bus
//! I/O off the async runtime. The thread exits when the last sender is
//! dropped, shutting the session down on its way out.

use std::io;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{info, trace};

use vfd_display::DisplaySession;
use vfd_protocol::Command;

/// Commands buffered before producers start waiting
pub const COMMAND_QUEUE_DEPTH: usize = 64;

/// Spawn the thread that owns the display session
pub fn spawn_session_writer(
    mut session: DisplaySession,
    mut commands: mpsc::Receiver<Command>,
) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("display-session".into())
        .spawn(move || {
            info!("session writer started");
            while let Some(command) = commands.blocking_recv() {
                trace!(?command, "applying");
                session.apply(command);
            }
            info!("session writer stopping");
            session.shutdown();
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfd_display::{MonoGlyphs, Sh1106};
    use vfd_hal::MockBus;
    use vfd_protocol::decode_message;

    fn open_session(bus: &MockBus) -> DisplaySession {
        let transport = Sh1106::new(bus.clone(), 0x3C);
        DisplaySession::open(Box::new(transport), Box::new(MonoGlyphs)).unwrap()
    }

    /// Reassemble the frames a session presented from the mock bus log
    fn presented_frames(bus: &MockBus) -> Vec<Vec<u8>> {
        const FRAME_LEN: usize = 128 * 8;
        let data = bus.stream(0x3C, 0x40);
        data.chunks(FRAME_LEN).map(|c| c.to_vec()).collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_producers_observe_only_whole_states() {
        // Two clients race `write` and `clear`; every frame that reaches the
        // wire must be a fully-applied state - rendered text or all-blank -
        // never a torn interleaving.
        let bus = MockBus::new();
        let session = open_session(&bus);

        // Reference frame: what "Hi" looks like when applied alone
        let reference = {
            let ref_bus = MockBus::new();
            let mut reference = open_session(&ref_bus);
            reference.apply(decode_message(br#"{"cmd":"write","text":"Hi","line":0}"#).unwrap());
            reference.framebuffer().as_bytes().to_vec()
        };

        bus.clear_log();
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let writer = spawn_session_writer(session, rx).unwrap();

        let mut producers = Vec::new();
        for round in 0..16 {
            let write_tx = tx.clone();
            let clear_tx = tx.clone();
            producers.push(tokio::spawn(async move {
                let cmd = decode_message(br#"{"cmd":"write","text":"Hi","line":0}"#).unwrap();
                write_tx.send(cmd).await.unwrap();
            }));
            producers.push(tokio::spawn(async move {
                // Stagger some of the clears behind the writes
                if round % 2 == 0 {
                    tokio::task::yield_now().await;
                }
                clear_tx.send(decode_message(b"clear").unwrap()).await.unwrap();
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }
        drop(tx);
        writer.join().unwrap();

        let blank = vec![0u8; 128 * 8];
        let frames = presented_frames(&bus);
        assert!(!frames.is_empty());
        for frame in &frames {
            assert!(
                *frame == reference || *frame == blank,
                "torn frame on the wire"
            );
        }
    }

    #[tokio::test]
    async fn test_writer_shuts_session_down_when_channel_closes() {
        let bus = MockBus::new();
        let session = open_session(&bus);
        let (tx, rx) = mpsc::channel(4);
        let writer = spawn_session_writer(session, rx).unwrap();

        tx.send(decode_message(b"write:hello").unwrap()).await.unwrap();
        drop(tx);
        writer.join().unwrap();

        // Shutdown powers the panel off
        let commands = bus.stream(0x3C, 0x00);
        assert_eq!(commands.last(), Some(&0xAE));
    }
}
