//! Bus abstraction for the VFD bridge
//!
//! This crate defines the narrow interface through which the display
//! transport adapters and the scan utility reach the physical bus:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  vfd-display adapters / i2c-scan     │
//! └──────────────────────────────────────┘
//!                   │
//!                   ▼
//! ┌──────────────────────────────────────┐
//! │  vfd-hal (this crate - `Bus` trait)  │
//! └──────────────────────────────────────┘
//!          │                  │
//!          ▼                  ▼
//! ┌─────────────────┐  ┌─────────────────┐
//! │    LinuxI2c     │  │     MockBus     │
//! │  (/dev/i2c-*)   │  │ (tests + sims)  │
//! └─────────────────┘  └─────────────────┘
//! ```
//!
//! The only `unsafe` in the workspace lives here: the `ioctl` selecting the
//! peripheral address on the Linux character device.

pub mod i2c;
pub mod mock;

pub use i2c::{Bus, LinuxI2c};
pub use mock::{BusWrite, MockBus};
