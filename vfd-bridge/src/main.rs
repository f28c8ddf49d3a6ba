//! VFD bridge daemon
//!
//! Binds one display session at startup, then serves the Unix socket:
//!
//! ```text
//! client ──socket──▶ connection task ──decode──▶ command channel
//!                                                      │
//!                                                      ▼
//!                                           session writer thread
//!                                                      │
//!                                        framebuffer ──▶ transport ──▶ bus
//! ```

mod server;
mod tasks;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vfd_display::{DisplayGeometry, DisplaySession, MonoGlyphs, Sh1106, Ssd1306, Transport};
use vfd_hal::LinuxI2c;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Controller {
    Sh1106,
    Ssd1306,
}

/// Bridge between VFD protocol clients and an I2C OLED display
#[derive(Debug, Parser)]
#[command(name = "vfd-bridge", version, about)]
struct Args {
    /// Socket path clients connect to
    #[arg(long, default_value = "/tmp/vfd_bridge.sock")]
    socket: PathBuf,

    /// I2C character device the display hangs off
    #[arg(long, default_value = "/dev/i2c-1")]
    bus: PathBuf,

    /// 7-bit display address ("0x3C" or decimal)
    #[arg(long, default_value = "0x3C", value_parser = parse_address)]
    address: u8,

    /// Display controller
    #[arg(long, value_enum, default_value_t = Controller::Sh1106)]
    controller: Controller,

    /// Panel height in pixels (64, or 32 for short ssd1306 panels)
    #[arg(long, default_value_t = 64)]
    height: i32,
}

fn parse_address(s: &str) -> Result<u8, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| format!("invalid i2c address `{s}`"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let geometry = match args.height {
        64 => DisplayGeometry::Panel128x64,
        32 => DisplayGeometry::Panel128x32,
        other => anyhow::bail!("unsupported panel height {other} (expected 64 or 32)"),
    };
    if args.controller == Controller::Sh1106 && geometry != DisplayGeometry::Panel128x64 {
        anyhow::bail!("sh1106 panels are 128x64 only");
    }

    let bus = LinuxI2c::open(&args.bus)
        .with_context(|| format!("opening bus {}", args.bus.display()))?;
    let transport: Box<dyn Transport> = match args.controller {
        Controller::Sh1106 => Box::new(Sh1106::new(bus, args.address)),
        Controller::Ssd1306 => Box::new(Ssd1306::new(bus, args.address, geometry)),
    };

    let mut session = match DisplaySession::open(transport, Box::new(MonoGlyphs)) {
        Ok(session) => session,
        Err(e) => {
            // Without a working display the bridge has no purpose
            error!("display transport open failed: {e}");
            return Err(e.into());
        }
    };

    // Startup banner while the socket comes up
    session.write("VFD Bridge");
    session.set_cursor(0, 8);
    session.write("starting...");

    if args.socket.exists() {
        std::fs::remove_file(&args.socket)
            .with_context(|| format!("removing stale socket {}", args.socket.display()))?;
    }
    let listener = UnixListener::bind(&args.socket)
        .with_context(|| format!("binding {}", args.socket.display()))?;
    info!(socket = %args.socket.display(), "vfd-bridge listening");

    session.clear();
    session.set_cursor(0, 0);
    session.write("VFD Bridge ready");

    let (commands, queue) = mpsc::channel(tasks::COMMAND_QUEUE_DEPTH);
    let writer = tasks::spawn_session_writer(session, queue)?;

    let served = server::run(listener, commands).await;

    // run() dropped the last command sender on return, which stops the
    // writer thread; it blanks and powers off the panel on its way out
    if writer.join().is_err() {
        error!("session writer panicked");
    }
    let _ = std::fs::remove_file(&args.socket);
    served?;
    Ok(())
}
