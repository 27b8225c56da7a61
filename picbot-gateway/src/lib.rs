//! Matrix picture bot: session loop, event handlers, daily scheduler.

pub mod bot;
pub mod matrix;
pub mod scheduler;
pub mod session;
