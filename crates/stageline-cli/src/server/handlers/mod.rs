//! API request handlers.

mod health;
mod reports;
mod staged;
mod tables;
mod validate;

pub use health::*;
pub use reports::*;
pub use staged::*;
pub use tables::*;
pub use validate::*;
