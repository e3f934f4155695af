//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the relay: the records
//! carried by the certificate-transparency stream, delivery outcomes, session
//! bundles, the relay configuration and the sink trait.
//! All business crates depend on this crate, reverse dependencies are prohibited.
//!
//! ## Ordering Model
//! - `DeliveryOutcome::index` is assigned once per record, 1-based, in arrival order
//! - Records are immutable after decode and only ever borrowed by sinks

mod config;
mod error;
mod outcome;
mod record;
mod session;
mod shutdown;
mod sink;

pub use config::*;
pub use error::*;
pub use outcome::*;
pub use record::*;
pub use session::*;
pub use shutdown::{ShutdownHandle, ShutdownSignal};
pub use sink::*;
