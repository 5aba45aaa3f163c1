//! Keeps a device clock in step with an NTP server.
//!
//! [`SyncPolicy::maybe_sync`] does one exchange with the configured server
//! through [`NtpClient`], compares the answer with the device clock and
//! steps the clock when the two disagree by more than [`DRIFT_THRESHOLD`].

pub mod clock;
pub mod config;
pub mod error;
pub mod net;
pub mod settings;
pub mod store;
pub mod sync;
pub mod time;

pub use clock::{set_system_time, ClockAuthority, ClockError, ClockSource};
pub use config::SyncConfig;
pub use error::{InvalidReply, SyncError};
pub use net::client::{NtpClient, TimeSource};
pub use sync::policy::{LogNotifier, Notifier, SyncOutcome, SyncPolicy};
pub use sync::preview::{PreviewHandle, PreviewLines, PreviewTask};
pub use time::{
    calc::TimeSample,
    drift::DRIFT_THRESHOLD,
    ticks::{TickRate, Ticks},
};
