mod app;
pub mod display;
mod main;
mod shell;

pub use app::*;
pub use main::*;
pub use shell::*;
