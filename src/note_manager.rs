use std::cmp::Reverse;

use log::{debug, error, info, warn};

use crate::{
    literal_matcher, IdSequence, Note, NoteUpdate, PaError, Result, SortOrder, Status, Storage,
};

/// Minimum title length used when none is configured
pub const DEFAULT_MIN_TITLE_LENGTH: usize = 3;

/// Owns the note list, its id sequence and its file.
pub struct NoteManager {
    /// Serialization boundary for the notes file
    storage: Storage<Note>,

    /// Source of fresh note ids
    sequence: IdSequence,

    /// Notes in storage order
    notes: Vec<Note>,

    /// Shortest accepted title, in characters
    min_title_length: usize,
}

impl NoteManager {
    /// Creates a manager, loading existing notes from `storage`.
    ///
    /// The id sequence sits next to the notes file and never hands out an
    /// id at or below one already in use.
    pub fn new(mut storage: Storage<Note>, min_title_length: usize) -> Self {
        let notes = storage.load();
        let floor = notes.iter().map(Note::id).max().map_or(1, |max| max + 1);
        let sequence = IdSequence::open(IdSequence::path_for(storage.file_path()), floor);

        debug!(
            "NoteManager starting with {} notes, next id {}",
            notes.len(),
            sequence.peek()
        );

        Self {
            storage,
            sequence,
            notes,
            min_title_length,
        }
    }

    pub fn min_title_length(&self) -> usize {
        self.min_title_length
    }

    pub fn set_min_title_length(&mut self, min_title_length: usize) {
        self.min_title_length = min_title_length;
    }

    /// Returns whether `note` passes the title, content and contact checks.
    pub fn validate(note: &Note, min_title_length: usize) -> bool {
        invalid_reason(note, min_title_length).is_none()
    }

    /// Builds a note with a fresh id. The note is not stored yet.
    pub fn create_note(
        &mut self,
        title: impl Into<String>,
        contact: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
    ) -> Result<Note> {
        let note = Note::new(self.sequence.peek(), title, contact, content, tags)?;
        self.sequence.next()?;
        Ok(note)
    }

    /// Stores `note` unless its title is taken, ignoring case.
    pub fn add(&mut self, note: Note) -> Result<Status> {
        if let Some(message) = invalid_reason(&note, self.min_title_length) {
            warn!("Rejected note '{}': {}", note.title(), message);
            return Err(PaError::InvalidNote { message });
        }

        let title = note.title().to_lowercase();
        if self.notes.iter().any(|n| n.title().to_lowercase() == title) {
            warn!("Note with the title '{}' already exists", note.title());
            return Ok(Status::Duplicate);
        }

        let previous = self.notes.clone();
        let id = note.id();
        self.notes.push(note);
        self.commit(previous)?;

        info!("Note {} successfully added", id);
        Ok(Status::Applied)
    }

    /// Note with this id; the last one wins if ids collide in old data.
    pub fn get_by_id(&self, id: u64) -> Option<&Note> {
        self.index_of(id).map(|index| &self.notes[index])
    }

    /// Notes whose title contains `query` as plain text, ignoring case.
    pub fn search_by_title(&self, query: &str) -> Result<Vec<&Note>> {
        let matcher = literal_matcher(query, "title")?;
        Ok(self
            .notes
            .iter()
            .filter(|n| matcher.is_match(n.title()))
            .collect())
    }

    /// Notes carrying exactly `tag`.
    pub fn search_by_tag(&self, tag: &str) -> Result<Vec<&Note>> {
        if tag.trim().is_empty() {
            return Err(PaError::EmptyQuery { what: "tag" });
        }
        Ok(self.notes.iter().filter(|n| n.has_tag(tag)).collect())
    }

    /// Replaces content and tags of note `id` in one step.
    pub fn edit(&mut self, id: u64, update: NoteUpdate) -> Result<Status> {
        let Some(index) = self.index_of(id) else {
            debug!("Note with id {} not found", id);
            return Ok(Status::NotFound);
        };

        let previous = self.notes.clone();
        if !self.notes[index].replace(update.content, update.tags) {
            debug!("Nothing to change in note {}", id);
            return Ok(Status::Unchanged);
        }
        self.commit(previous)?;

        info!("Note {} updated successfully", id);
        Ok(Status::Applied)
    }

    /// Removes the first note titled exactly `title`.
    pub fn remove(&mut self, title: &str) -> Result<Status> {
        let Some(index) = self.notes.iter().position(|n| n.title() == title) else {
            debug!("Note titled '{}' not found for removal", title);
            return Ok(Status::NotFound);
        };

        let previous = self.notes.clone();
        let removed = self.notes.remove(index);
        self.commit(previous)?;

        info!("Note {} ('{}') successfully deleted", removed.id(), title);
        Ok(Status::Applied)
    }

    /// Attaches `tag` to note `id`.
    pub fn add_tag(&mut self, id: u64, tag: &str) -> Result<Status> {
        let Some(index) = self.index_of(id) else {
            return Ok(Status::NotFound);
        };

        let previous = self.notes.clone();
        if !self.notes[index].add_tag(tag)? {
            debug!("Tag '{}' already present on note {}", tag, id);
            return Ok(Status::Unchanged);
        }
        self.commit(previous)?;

        info!("Tag '{}' added to note {}", tag.trim(), id);
        Ok(Status::Applied)
    }

    /// Detaches `tag` from note `id`.
    pub fn remove_tag(&mut self, id: u64, tag: &str) -> Result<Status> {
        let Some(index) = self.index_of(id) else {
            return Ok(Status::NotFound);
        };

        let previous = self.notes.clone();
        if !self.notes[index].remove_tag(tag) {
            debug!("Tag '{}' not present on note {}", tag, id);
            return Ok(Status::Unchanged);
        }
        self.commit(previous)?;

        info!("Tag '{}' removed from note {}", tag.trim(), id);
        Ok(Status::Applied)
    }

    /// Notes ordered by tag count, then by their sorted tags.
    ///
    /// `desc` reverses the whole key. Equal keys keep storage order. The
    /// stored list itself is not reordered.
    pub fn sort_by_tags(&self, order: &str) -> Result<Vec<&Note>> {
        let order: SortOrder = order.parse()?;
        let mut view: Vec<&Note> = self.notes.iter().collect();

        match order {
            SortOrder::Asc => view.sort_by_cached_key(|n| tag_key(n)),
            SortOrder::Desc => view.sort_by_cached_key(|n| Reverse(tag_key(n))),
        }
        Ok(view)
    }

    /// The live note list in storage order.
    pub fn all(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn index_of(&self, id: u64) -> Option<usize> {
        self.notes.iter().rposition(|n| n.id() == id)
    }

    /// Persists the list, restoring `previous` if the write fails.
    fn commit(&mut self, previous: Vec<Note>) -> Result<()> {
        if let Err(e) = self.storage.save(&self.notes) {
            error!("Failed to persist notes, changes rolled back: {}", e);
            self.notes = previous;
            return Err(e);
        }
        Ok(())
    }
}

fn tag_key(note: &Note) -> (usize, Vec<String>) {
    (note.tags().len(), note.sorted_tags())
}

fn invalid_reason(note: &Note, min_title_length: usize) -> Option<String> {
    let title_length = note.title().trim().chars().count();
    if title_length < min_title_length {
        return Some(format!(
            "title must be at least {} characters long",
            min_title_length
        ));
    }
    if note.content().trim().is_empty() {
        return Some("content cannot be empty".to_string());
    }
    if note.contact().trim().is_empty() {
        return Some("contact cannot be empty".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> NoteManager {
        NoteManager::new(
            Storage::new(dir.path().join("notes.json")),
            DEFAULT_MIN_TITLE_LENGTH,
        )
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    fn add(notes: &mut NoteManager, title: &str, tag_list: &[&str]) -> u64 {
        let note = notes
            .create_note(title, "Ann", "some content", tags(tag_list))
            .unwrap();
        let id = note.id();
        assert_eq!(notes.add(note).unwrap(), Status::Applied);
        id
    }

    fn titles<'a>(notes: &[&'a Note]) -> Vec<&'a str> {
        notes.iter().map(|n| n.title()).collect()
    }

    #[test]
    fn validate_checks_title_length_content_and_contact() {
        let note = Note::new(1, "Hi", "Ann", "text", vec![]).unwrap();
        assert!(!NoteManager::validate(&note, 3));
        assert!(NoteManager::validate(&note, 2));
    }

    #[test]
    fn add_rejects_short_titles_with_an_error() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        let note = notes.create_note("Hi", "Ann", "text", vec![]).unwrap();
        assert!(matches!(notes.add(note), Err(PaError::InvalidNote { .. })));
        assert!(notes.is_empty());
    }

    #[test]
    fn add_rejects_titles_equal_ignoring_case() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        add(&mut notes, "Shopping", &[]);

        let clash = notes.create_note("SHOPPING", "Bob", "eggs", vec![]).unwrap();
        assert_eq!(notes.add(clash).unwrap(), Status::Duplicate);
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        let first = add(&mut notes, "First", &[]);
        let second = add(&mut notes, "Second", &[]);
        notes.remove("First").unwrap();

        let third = add(&mut notes, "Third", &[]);
        assert!(third > second && second > first);

        let mut reopened = manager(&dir);
        let fourth = add(&mut reopened, "Fourth", &[]);
        assert!(fourth > third);
    }

    #[test]
    fn ids_start_above_existing_data_without_a_sequence_file() {
        let dir = TempDir::new().unwrap();
        let legacy = serde_json::json!([
            {"id": 2, "title": "Old", "contact": "Ann", "content": "x", "tags": [],
             "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"},
            {"id": 2, "title": "Older", "contact": "Ann", "content": "y", "tags": [],
             "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}
        ]);
        fs::write(dir.path().join("notes.json"), legacy.to_string()).unwrap();

        let mut notes = manager(&dir);
        assert_eq!(notes.get_by_id(2).unwrap().title(), "Older");
        assert_eq!(add(&mut notes, "Fresh", &[]), 3);
    }

    #[test]
    fn search_by_title_is_literal_and_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        add(&mut notes, "Shopping list", &[]);
        add(&mut notes, "Work (urgent)", &[]);

        assert_eq!(titles(&notes.search_by_title("SHOP").unwrap()), ["Shopping list"]);
        assert_eq!(titles(&notes.search_by_title("(urgent").unwrap()), ["Work (urgent)"]);
        assert!(notes.search_by_title("").is_err());
    }

    #[test]
    fn search_by_tag_requires_exact_membership() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        add(&mut notes, "Shopping", &["home", "urgent"]);
        add(&mut notes, "Report", &["work"]);

        assert_eq!(titles(&notes.search_by_tag("urgent").unwrap()), ["Shopping"]);
        assert!(notes.search_by_tag("urg").unwrap().is_empty());
        assert!(notes.search_by_tag(" ").is_err());
    }

    #[test]
    fn edit_replaces_content_and_tags_together() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        let id = add(&mut notes, "Shopping", &["home"]);
        let before = notes.get_by_id(id).unwrap().updated_at();

        let update = NoteUpdate {
            content: Some("bread".to_string()),
            tags: Some(tags(&["food"])),
        };
        assert_eq!(notes.edit(id, update).unwrap(), Status::Applied);

        let note = notes.get_by_id(id).unwrap();
        assert_eq!(note.content(), "bread");
        assert_eq!(note.tags(), ["food"]);
        assert!(note.updated_at() >= before);

        assert_eq!(
            notes.edit(id, NoteUpdate::default()).unwrap(),
            Status::Unchanged
        );
        assert_eq!(
            notes.edit(999, NoteUpdate::default()).unwrap(),
            Status::NotFound
        );
    }

    #[test]
    fn edit_with_only_content_keeps_tags() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        let id = add(&mut notes, "Shopping", &["home"]);

        let update = NoteUpdate {
            content: Some("eggs".to_string()),
            tags: Some(vec![]),
        };
        notes.edit(id, update).unwrap();
        assert_eq!(notes.get_by_id(id).unwrap().tags(), ["home"]);
    }

    #[test]
    fn remove_matches_exact_title() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        add(&mut notes, "Shopping", &[]);

        assert_eq!(notes.remove("shopping").unwrap(), Status::NotFound);
        assert_eq!(notes.remove("Shopping").unwrap(), Status::Applied);
        assert_eq!(notes.remove("Shopping").unwrap(), Status::NotFound);
    }

    #[test]
    fn tag_mutations_report_unchanged_and_persist() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        let id = add(&mut notes, "Shopping", &[]);

        assert_eq!(notes.add_tag(id, "urgent").unwrap(), Status::Applied);
        assert_eq!(notes.add_tag(id, "urgent").unwrap(), Status::Unchanged);
        assert_eq!(notes.add_tag(42, "urgent").unwrap(), Status::NotFound);

        let reopened = manager(&dir);
        assert!(reopened.get_by_id(id).unwrap().has_tag("urgent"));

        assert_eq!(notes.remove_tag(id, "urgent").unwrap(), Status::Applied);
        assert_eq!(notes.remove_tag(id, "urgent").unwrap(), Status::Unchanged);
        assert!(manager(&dir).get_by_id(id).unwrap().tags().is_empty());
    }

    #[test]
    fn sort_by_tags_orders_by_count_then_tags() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        add(&mut notes, "Three", &["c", "b", "a"]);
        add(&mut notes, "OneZ", &["z"]);
        add(&mut notes, "None", &[]);
        add(&mut notes, "OneA", &["a"]);

        let asc = titles(&notes.sort_by_tags("asc").unwrap());
        assert_eq!(asc, ["None", "OneA", "OneZ", "Three"]);

        let mut desc = titles(&notes.sort_by_tags("desc").unwrap());
        desc.reverse();
        assert_eq!(desc, asc);

        assert_eq!(titles(&notes.all().iter().collect::<Vec<_>>())[0], "Three");
    }

    #[test]
    fn sort_by_tags_is_stable_for_equal_keys() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        add(&mut notes, "First", &["x"]);
        add(&mut notes, "Second", &["x"]);

        assert_eq!(titles(&notes.sort_by_tags("asc").unwrap()), ["First", "Second"]);
        assert_eq!(titles(&notes.sort_by_tags("desc").unwrap()), ["First", "Second"]);
    }

    #[test]
    fn sort_by_tags_rejects_unknown_order() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        add(&mut notes, "First", &["x"]);

        assert!(matches!(
            notes.sort_by_tags("sideways"),
            Err(PaError::InvalidSortOrder { .. })
        ));
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn failed_save_rolls_back_every_mutation() {
        let dir = TempDir::new().unwrap();
        let mut notes = manager(&dir);
        let id = add(&mut notes, "Shopping", &["home"]);
        let before = notes.all().to_vec();

        // A directory in place of the data file makes every save fail.
        let path = dir.path().join("notes.json");
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let extra = notes
            .create_note("Errands", "Ann", "post office", Vec::new())
            .unwrap();
        assert!(notes.add(extra).is_err());
        assert!(notes.add_tag(id, "urgent").is_err());
        assert!(notes.remove_tag(id, "home").is_err());
        let update = NoteUpdate {
            content: Some("bread".to_string()),
            tags: None,
        };
        assert!(notes.edit(id, update).is_err());
        assert!(notes.remove("Shopping").is_err());

        assert_eq!(notes.all(), before.as_slice());
    }

    #[test]
    fn notes_with_offsetless_timestamps_are_loaded() {
        let dir = TempDir::new().unwrap();
        let data = serde_json::json!([{
            "id": 1,
            "title": "Shopping",
            "contact": "Ann",
            "content": "milk",
            "tags": ["home"],
            "created_at": "2024-10-01T12:30:00.123456",
            "updated_at": "2024-10-01T12:30:00.123456"
        }]);
        fs::write(dir.path().join("notes.json"), data.to_string()).unwrap();

        let mut notes = manager(&dir);
        assert_eq!(notes.len(), 1);

        // Saving again keeps the note, now with an explicit offset
        notes.add_tag(1, "urgent").unwrap();
        let reopened = manager(&dir);
        assert_eq!(reopened.get_by_id(1).unwrap().tags(), ["home", "urgent"]);
    }
}
