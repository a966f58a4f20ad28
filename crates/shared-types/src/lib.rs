//! # Shared Types Crate
//!
//! Types shared by every futarchy subsystem crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifiers and timestamps are defined once here.
//! - **Phantom Custody**: `Balance<A>` carries its asset as a zero-sized type
//!   parameter so a stable-asset bond can never be mixed with another asset.
//! - **Trusted Time**: all time guards read a `Clock`, never the system time directly.
//! - **Shared Failure Taxonomy**: every subsystem error maps onto `FailureKind`.

pub mod balance;
pub mod clock;
pub mod entities;
pub mod errors;

pub use balance::{Asset, Balance, BalanceError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entities::*;
pub use errors::FailureKind;
