#![allow(dead_code)]

pub mod events;
pub mod handlers;
pub mod strategies;

pub use events::*;
pub use handlers::*;
