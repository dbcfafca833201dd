pub mod capability;
pub mod config;
pub mod error;
pub mod plan;
pub mod registration;
pub mod stream;
pub mod tool;
pub mod trace;

pub use error::{Error, Result};
