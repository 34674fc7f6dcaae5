//! Common components and data for liveuser crates.

pub mod config;
#[cfg(feature = "logging")]
pub mod logging;
pub mod system_user;
