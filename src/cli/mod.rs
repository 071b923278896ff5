//! Command runners and terminal rendering.

pub mod history;
pub mod setup;
pub mod strategies;
pub mod suggest;
pub mod ui;
