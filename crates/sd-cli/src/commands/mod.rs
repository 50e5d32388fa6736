//! Command implementations

pub mod check;
pub mod common;
pub mod migrate;
pub mod new;
pub mod status;
