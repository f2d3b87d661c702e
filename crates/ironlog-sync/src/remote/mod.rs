//! # Remote Stores
//!
//! Implementations of [`ironlog_core::RemoteStore`]:
//!
//! - [`RestRemote`] - the hosted backend over HTTP
//! - [`MemoryRemote`] - in-process tables with the same constraints

pub mod memory;
pub mod rest;

pub use memory::MemoryRemote;
pub use rest::RestRemote;
