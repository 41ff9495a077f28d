//! # Remux Core
//!
//! Core types for the remux library.
//!
//! This crate provides the building blocks shared by every remux component:
//! - Error handling types
//! - Rational numbers and time base conversion
//! - Timestamp management
//! - Packet abstractions for compressed media data

pub mod error;
pub mod packet;
pub mod rational;
pub mod timestamp;

pub use error::{Error, OpenError, ReadError, Result, WriteError};
pub use packet::{Packet, PacketFlags};
pub use rational::Rational;
pub use timestamp::{Duration, TimeBase, Timestamp};
