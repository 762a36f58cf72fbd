pub mod adapters;
pub mod contracts;
pub mod executor;

pub use adapters::*;
pub use contracts::*;
pub use executor::*;
