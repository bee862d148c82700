//! Core data structures shared across the pabook application.
//!
//! Outcome values returned by the managers, query parameters and the
//! subcommand definitions used by both the one-shot CLI and the shell.
use std::{fmt, path::PathBuf, str::FromStr};

use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};

use crate::PaError;

/// A specialized Result type for pabook operations.
pub type Result<T> = std::result::Result<T, PaError>;

/// Outcome of a user-driven mutation that did not fail.
///
/// Misses and collisions are expected answers to user input, so they are
/// reported here instead of through [`PaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The change was made and persisted.
    Applied,
    /// No record matched the given key.
    NotFound,
    /// A record with the same key already exists.
    Duplicate,
    /// The record already was in the requested state.
    Unchanged,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::Applied => "applied",
            Status::NotFound => "not found",
            Status::Duplicate => "already exists",
            Status::Unchanged => "unchanged",
        };
        f.write_str(text)
    }
}

/// Direction for [`crate::NoteManager::sort_by_tags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = PaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(PaError::InvalidSortOrder {
                value: s.to_string(),
            }),
        }
    }
}

/// A contact whose next birthday falls inside the requested window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingBirthday {
    pub name: String,
    /// Next occurrence of the birthday, on or after the reference day
    pub congratulation_date: NaiveDate,
}

/// Replacement values for [`crate::NoteManager::edit`].
///
/// `None` or empty values leave the corresponding field untouched.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Contact field targeted by a contact search
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContactField {
    Name,
    Email,
    Phone,
}

/// Available subcommands for the pabook application
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new contact (missing fields are prompted for)
    AddContact {
        /// Unique name of the contact
        #[clap(short, long)]
        name: Option<String>,

        /// Residential address
        #[clap(short, long)]
        address: Option<String>,

        /// Phone number, e.g. +380501234567 or 0501234567
        #[clap(short, long)]
        phone: Option<String>,

        /// Email address
        #[clap(short, long)]
        email: Option<String>,

        /// Birthday in DD.MM.YYYY format
        #[clap(short, long)]
        birthday: Option<String>,
    },

    /// Edit an existing contact; omitted fields keep their current value
    EditContact {
        /// Name of the contact to edit
        name: String,

        /// New name for the contact
        #[clap(long)]
        new_name: Option<String>,

        #[clap(short, long)]
        address: Option<String>,

        #[clap(short, long)]
        phone: Option<String>,

        #[clap(short, long)]
        email: Option<String>,

        #[clap(short, long)]
        birthday: Option<String>,
    },

    /// Remove a contact by name
    RemoveContact {
        /// Exact name of the contact
        name: String,
    },

    /// Search contacts by name, email or phone
    SearchContacts {
        /// Text to look for
        query: String,

        /// Field to search in
        #[clap(short, long, value_enum, default_value_t = ContactField::Name)]
        by: ContactField,
    },

    /// Show all contacts
    AllContacts,

    /// Show contacts with a birthday in the coming days
    Birthdays {
        /// Size of the window in days (default from configuration)
        #[clap(short, long)]
        days: Option<i64>,
    },

    /// Add a new note (missing fields are prompted for)
    AddNote {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Name of the associated contact
        #[clap(short = 'C', long)]
        contact: Option<String>,

        /// Text of the note
        #[clap(short, long)]
        content: Option<String>,

        /// Tags to attach (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,
    },

    /// Replace the content and/or tags of a note
    EditNote {
        /// ID of the note to edit
        id: u64,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,

        /// New tags for the note (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Open the current content in an editor
        #[clap(short, long)]
        editor: bool,
    },

    /// Remove a note by title
    RemoveNote {
        /// Exact title of the note
        title: String,
    },

    /// Search notes by title or by tag
    SearchNotes {
        /// Part of the title to look for
        #[clap(short = 'T', long, conflicts_with = "tag", required_unless_present = "tag")]
        title: Option<String>,

        /// Exact tag to look for
        #[clap(short, long)]
        tag: Option<String>,
    },

    /// Show all notes
    AllNotes,

    /// Attach a tag to a note
    AddTag {
        /// ID of the note
        id: u64,

        /// Tag to attach
        tag: String,
    },

    /// Detach a tag from a note
    RemoveTag {
        /// ID of the note
        id: u64,

        /// Tag to detach
        tag: String,
    },

    /// List notes ordered by their tags
    SortNotes {
        /// asc or desc
        #[clap(default_value = "asc")]
        order: String,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}

/// Paths given on the command line that override the configuration file
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub contacts_file: Option<PathBuf>,
    pub notes_file: Option<PathBuf>,
}
