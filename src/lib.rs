//! Personal assistant library for contacts and notes
//!
//! This library keeps an address book and a tagged note collection, each
//! persisted as a JSON array in its own file, and provides the command line
//! and interactive shell built on top of them.

mod cli;
mod config;
mod contact;
mod contact_manager;
mod errors;
mod helper;
mod note;
mod note_manager;
mod storage;
mod types;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use contact::*;
pub use contact_manager::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use note_manager::*;
pub use storage::*;
pub use types::*;
