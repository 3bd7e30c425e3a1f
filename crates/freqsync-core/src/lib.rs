pub mod apply;
pub mod catalog;
pub mod config;
pub mod detect;
pub mod error;
pub mod events;
pub mod hash;
pub mod io;
pub mod orchestrator;
pub mod process;
pub mod restart;
pub mod transport;
pub mod types;
pub mod version;

#[cfg(test)]
mod testing;

pub use error::{Result, SyncError};
