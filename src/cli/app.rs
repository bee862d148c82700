//! CLI module for the pabook application
//!
//! This module turns parsed commands into calls on the contact and note
//! managers and reports the outcome on the console.
use std::{
    fs::{read_to_string, OpenOptions},
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::Command,
};

use log::{debug, info};
use shell_words::split;
use tempfile::Builder;

use crate::{
    cli::display::{self, failure, notice, success},
    parse_tags, Commands, Config, Contact, ContactField, ContactManager, NoteManager, NoteUpdate,
    PaError, PathOverrides, Result, Status, Storage,
};

const EDITOR_HINT: &str =
    "<!-- This line and the one above are ignored. Save and exit when done. -->";

/// CLI Application handler - processes commands against the two managers
pub struct App {
    contacts: ContactManager,
    notes: NoteManager,

    /// Settings as read from (and written back to) the configuration file
    stored_config: Config,

    /// Command line paths, kept out of the configuration file
    overrides: PathOverrides,

    /// `stored_config` with `overrides` applied; what the managers run on
    config: Config,

    /// Where `config --set` and `config --reset` persist to
    config_path: Option<PathBuf>,
}

impl App {
    /// Opens both data files named by the stored settings and the overrides.
    pub fn new(
        stored_config: Config,
        overrides: PathOverrides,
        config_path: Option<PathBuf>,
    ) -> Self {
        let config = effective_config(&stored_config, &overrides);
        let contacts = ContactManager::new(Storage::new(&config.contacts_path));
        let notes = NoteManager::new(Storage::new(&config.notes_path), config.min_title_length);
        debug!(
            "App opened {} and {}",
            config.contacts_path.display(),
            config.notes_path.display()
        );

        Self {
            contacts,
            notes,
            stored_config,
            overrides,
            config,
            config_path,
        }
    }

    pub fn contacts(&self) -> &ContactManager {
        &self.contacts
    }

    pub fn notes(&self) -> &NoteManager {
        &self.notes
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the given command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::AddContact {
                name,
                address,
                phone,
                email,
                birthday,
            } => self.add_contact(name, address, phone, email, birthday)?,

            Commands::EditContact {
                name,
                new_name,
                address,
                phone,
                email,
                birthday,
            } => self.edit_contact(&name, new_name, address, phone, email, birthday)?,

            Commands::RemoveContact { name } => {
                let status = self.contacts.remove(&name)?;
                report(status, &format!("Contact {} removed", name), &name);
            }

            Commands::SearchContacts { query, by } => self.search_contacts(&query, by)?,

            Commands::AllContacts => {
                if self.contacts.is_empty() {
                    notice("No contacts saved yet.");
                } else {
                    display::print_table(
                        display::CONTACT_HEADERS,
                        &display::contact_rows(self.contacts.all()),
                    );
                }
            }

            Commands::Birthdays { days } => {
                let days = days.unwrap_or(self.config.birthday_window_days);
                let upcoming = self.contacts.upcoming_birthdays(days);
                if upcoming.is_empty() {
                    notice(format!("No birthdays in the next {} days.", days));
                } else {
                    display::print_table(
                        display::BIRTHDAY_HEADERS,
                        &display::birthday_rows(&upcoming),
                    );
                }
            }

            Commands::AddNote {
                title,
                contact,
                content,
                tags,
            } => self.add_note(title, contact, content, tags)?,

            Commands::EditNote {
                id,
                content,
                tags,
                editor,
            } => self.edit_note(id, content, tags, editor)?,

            Commands::RemoveNote { title } => {
                let status = self.notes.remove(&title)?;
                report(status, &format!("Note '{}' removed", title), &title);
            }

            Commands::SearchNotes { title, tag } => {
                let found = match (title, tag) {
                    (Some(title), _) => self.notes.search_by_title(&title)?,
                    (None, Some(tag)) => self.notes.search_by_tag(&tag)?,
                    (None, None) => return Err(PaError::EmptyQuery { what: "title or tag" }),
                };
                if found.is_empty() {
                    notice("No notes found matching the criteria.");
                } else {
                    display::print_table(display::NOTE_HEADERS, &display::note_rows(found));
                }
            }

            Commands::AllNotes => {
                if self.notes.is_empty() {
                    notice("No notes saved yet.");
                } else {
                    display::print_table(
                        display::NOTE_HEADERS,
                        &display::note_rows(self.notes.all()),
                    );
                }
            }

            Commands::AddTag { id, tag } => {
                let status = self.notes.add_tag(id, &tag)?;
                report(
                    status,
                    &format!("Tag '{}' added to note {}", tag, id),
                    &format!("note {}", id),
                );
            }

            Commands::RemoveTag { id, tag } => {
                let status = self.notes.remove_tag(id, &tag)?;
                report(
                    status,
                    &format!("Tag '{}' removed from note {}", tag, id),
                    &format!("note {}", id),
                );
            }

            Commands::SortNotes { order } => {
                let sorted = self.notes.sort_by_tags(&order)?;
                if sorted.is_empty() {
                    notice("No notes saved yet.");
                } else {
                    display::print_table(display::NOTE_HEADERS, &display::note_rows(sorted));
                }
            }

            Commands::Config { show, set, reset } => self.handle_config(show, set, reset)?,
        }

        Ok(())
    }

    fn add_contact(
        &mut self,
        name: Option<String>,
        address: Option<String>,
        phone: Option<String>,
        email: Option<String>,
        birthday: Option<String>,
    ) -> Result<()> {
        let name = or_prompt(name, "Name")?;
        let address = or_prompt(address, "Address")?;
        let phone = or_prompt(phone, "Phone number")?;
        let email = or_prompt(email, "Email")?;
        let birthday = or_prompt(birthday, "Birthday (DD.MM.YYYY)")?;

        let contact = Contact::new(name.clone(), address, phone, email, &birthday)?;
        let status = self.contacts.add(contact)?;
        report(status, &format!("Contact {} added", name), &name);
        Ok(())
    }

    fn edit_contact(
        &mut self,
        name: &str,
        new_name: Option<String>,
        address: Option<String>,
        phone: Option<String>,
        email: Option<String>,
        birthday: Option<String>,
    ) -> Result<()> {
        let Some(current) = self.contacts.get(name) else {
            report(Status::NotFound, "", name);
            return Ok(());
        };

        let updated = Contact::new(
            new_name.unwrap_or_else(|| current.name().to_string()),
            address.unwrap_or_else(|| current.address().to_string()),
            phone.unwrap_or_else(|| current.phone_number().to_string()),
            email.unwrap_or_else(|| current.email().to_string()),
            &birthday.unwrap_or_else(|| current.birthday_string()),
        )?;
        let new_name = updated.name().to_string();

        let status = self.contacts.edit(name, updated)?;
        report(status, &format!("Contact {} updated", name), &new_name);
        Ok(())
    }

    fn search_contacts(&self, query: &str, by: ContactField) -> Result<()> {
        let found = match by {
            ContactField::Name => self.contacts.search_by_name(query)?,
            ContactField::Email => self.contacts.search_by_email(query),
            ContactField::Phone => self.contacts.search_by_phone(query),
        };

        if found.is_empty() {
            notice(format!("No contacts matching \"{}\".", query));
        } else {
            display::print_table(display::CONTACT_HEADERS, &display::contact_rows(found));
        }
        Ok(())
    }

    fn add_note(
        &mut self,
        title: Option<String>,
        contact: Option<String>,
        content: Option<String>,
        tags: Option<String>,
    ) -> Result<()> {
        let title = or_prompt(title, "Title")?;
        let contact = or_prompt(contact, "Contact")?;
        let content = or_prompt(content, "Content")?;
        let tags = match tags {
            Some(tags) => parse_tags(Some(tags)),
            None => parse_tags(Some(prompt("Tags (comma-separated, optional)")?)),
        };

        if self.contacts.get(&contact).is_none() {
            notice(format!(
                "There is no contact named {}; the note keeps the name as typed.",
                contact
            ));
        }

        let note = self.notes.create_note(title.clone(), contact, content, tags)?;
        let id = note.id();
        let status = self.notes.add(note)?;
        report(status, &format!("Note created with ID: {}", id), &title);
        Ok(())
    }

    fn edit_note(
        &mut self,
        id: u64,
        content: Option<String>,
        tags: Option<String>,
        open_editor: bool,
    ) -> Result<()> {
        if content.is_some() && open_editor {
            return Err(PaError::EditorError {
                message: "Cannot specify both --content and --editor".to_string(),
            });
        }

        let content = if open_editor {
            let Some(note) = self.notes.get_by_id(id) else {
                report(Status::NotFound, "", &format!("note {}", id));
                return Ok(());
            };
            Some(self.open_editor_with_content(note.title(), note.content())?)
        } else {
            content
        };

        let update = NoteUpdate {
            content,
            tags: tags.map(|t| parse_tags(Some(t))),
        };
        let status = self.notes.edit(id, update)?;
        report(status, &format!("Note {} updated", id), &format!("note {}", id));
        Ok(())
    }

    fn open_editor_with_content(&self, title: &str, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().prefix("pabook-").suffix(".txt").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        let header = editor_header(title);
        let mut file = OpenOptions::new().write(true).open(&temp_path)?;
        for line in &header {
            writeln!(file, "{}", line)?;
        }
        write!(file, "{}", existing_content)?;
        drop(file);

        let editor_cmd = self.config.get_editor_command();
        info!("Opening {} to edit note '{}'", editor_cmd, title);
        launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(strip_editor_header(&content, &header))
    }

    fn handle_config(&mut self, show: bool, set: Option<String>, reset: bool) -> Result<()> {
        // Plain `config` shows the settings
        let show = show || (set.is_none() && !reset);

        if reset {
            self.stored_config.reset();
            self.persist_config()?;
            success("Configuration reset to defaults");
        }

        if let Some(assignment) = &set {
            self.stored_config.set(assignment)?;
            self.persist_config()?;
            success(format!("Configuration updated: {}", assignment.trim()));
        }

        if reset || set.is_some() {
            self.apply_stored_config();
        }

        if show {
            println!("{}", serde_json::to_string_pretty(&self.config)?);
            if let Some(path) = &self.config_path {
                println!("Configuration file: {}", path.display());
            }
        }
        Ok(())
    }

    fn persist_config(&self) -> Result<()> {
        let path = self.config_path.as_ref().ok_or_else(|| PaError::ConfigError {
            message: "No location available for the configuration file".to_string(),
        })?;
        self.stored_config.save(path)
    }

    /// Brings the running managers in line with changed stored settings.
    ///
    /// A manager whose file moved is reopened on the new file; paths given
    /// on the command line keep winning for the rest of the session.
    fn apply_stored_config(&mut self) {
        let config = effective_config(&self.stored_config, &self.overrides);

        if config.contacts_path != self.config.contacts_path {
            info!("Switching contacts to {}", config.contacts_path.display());
            self.contacts = ContactManager::new(Storage::new(&config.contacts_path));
            notice(format!("Contacts now read from {}", config.contacts_path.display()));
        }
        if config.notes_path != self.config.notes_path {
            info!("Switching notes to {}", config.notes_path.display());
            self.notes =
                NoteManager::new(Storage::new(&config.notes_path), config.min_title_length);
            notice(format!("Notes now read from {}", config.notes_path.display()));
        }
        if self.overrides.contacts_file.is_some() || self.overrides.notes_file.is_some() {
            notice("Paths given on the command line stay in effect for this session.");
        }

        self.notes.set_min_title_length(config.min_title_length);
        self.config = config;
    }
}

fn effective_config(stored: &Config, overrides: &PathOverrides) -> Config {
    let mut config = stored.clone();
    config.apply_overrides(overrides);
    config
}

/// Reports a manager outcome; `subject` names the record for the other cases.
fn report(status: Status, applied: &str, subject: &str) {
    debug!("Outcome for {}: {}", subject, status);
    match status {
        Status::Applied => success(applied),
        Status::NotFound => notice(format!("{} not found.", subject)),
        Status::Duplicate => failure(format!("{} already exists.", subject)),
        Status::Unchanged => notice(format!("Nothing to change for {}.", subject)),
    }
}

fn or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt(label),
    }
}

/// Asks for one line on stdin; end of input yields an empty answer.
fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    stdout().flush()?;

    let mut input = String::new();
    stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn launch_editor(editor_cmd: &str, file_path: &Path) -> Result<()> {
    let path_str = file_path.to_string_lossy();

    let args = split(editor_cmd).map_err(|e| PaError::EditorError {
        message: format!("Failed to parse editor command: {}", e),
    })?;

    let Some((program, rest)) = args.split_first() else {
        return Err(PaError::EditorError {
            message: "Empty editor command".to_string(),
        });
    };

    let status = Command::new(program)
        .args(rest)
        .arg(path_str.as_ref())
        .status()
        .map_err(|e| PaError::EditorError {
            message: format!("Failed to execute editor command: {}", e),
        })?;

    if !status.success() {
        return Err(PaError::EditorError {
            message: "Editor exited with non-zero status".to_string(),
        });
    }

    Ok(())
}

fn editor_header(title: &str) -> [String; 2] {
    [
        format!("<!-- Editing note: {} -->", title.replace('\n', " ")),
        EDITOR_HINT.to_string(),
    ]
}

/// Drops the header lines written before the note text, if still in place.
fn strip_editor_header(content: &str, header: &[String]) -> String {
    let mut lines = content.lines().peekable();
    for expected in header {
        if lines.next_if(|line| line.trim_end() == expected.as_str()).is_none() {
            break;
        }
    }
    lines.collect::<Vec<&str>>().join("\n").trim().to_string()
}
