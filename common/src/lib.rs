pub mod messages;
mod thaler;

pub use thaler::*;
