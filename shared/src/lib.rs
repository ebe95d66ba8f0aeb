#![doc = include_str!("../../README.md")]
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[macro_use]
mod fmt;

pub mod controller;
pub mod error;
pub mod hash;
pub mod record;
pub mod region;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use controller::{Command, Geometry, NvmController, PageSize};
pub use error::FlashError;
pub use record::TypedRecordStore;
pub use region::FlashRegion;
pub use zerocopy;
