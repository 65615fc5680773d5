pub mod check;
pub mod competition;
pub mod config;
pub mod diff;
pub mod error;
pub mod io;
pub mod notify;
pub mod paths;
pub mod store;
pub mod wca;

pub use error::{CompwatchError, Result};
