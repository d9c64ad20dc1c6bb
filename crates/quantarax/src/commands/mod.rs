//! Command implementations

pub mod completions;
pub mod config_cmd;
pub mod doctor;
pub mod identity;
pub mod receive;
pub mod send;
pub mod version;
