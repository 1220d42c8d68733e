pub mod cli;
pub mod content;
pub mod router;

mod error;

pub use error::Error;
