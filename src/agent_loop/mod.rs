//! The agent loop: prompt, complete, interpret, dispatch, repeat.

pub mod events;
pub mod runner;
pub mod types;

pub use events::*;
pub use runner::*;
pub use types::*;
