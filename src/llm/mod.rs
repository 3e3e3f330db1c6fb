pub mod client;
pub mod narrator;
pub mod prompts;

pub use client::*;
pub use narrator::*;
