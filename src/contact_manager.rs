use chrono::{Datelike, Days, Local, NaiveDate};
use log::{debug, error, info, warn};

use crate::{literal_matcher, Contact, Result, Status, Storage, UpcomingBirthday};

/// Owns the contact list and keeps its file in step with it.
pub struct ContactManager {
    /// Serialization boundary for the contacts file
    storage: Storage<Contact>,

    /// Contacts in storage order
    contacts: Vec<Contact>,
}

impl ContactManager {
    /// Creates a manager, loading existing contacts from `storage`.
    pub fn new(mut storage: Storage<Contact>) -> Self {
        let contacts = storage.load();
        debug!("ContactManager starting with {} contacts", contacts.len());
        Self { storage, contacts }
    }

    /// Adds a contact unless one with the same name exists.
    pub fn add(&mut self, contact: Contact) -> Result<Status> {
        if self.get(contact.name()).is_some() {
            warn!("Contact with the name '{}' already exists", contact.name());
            return Ok(Status::Duplicate);
        }

        let previous = self.contacts.clone();
        let name = contact.name().to_string();
        self.contacts.push(contact);
        self.commit(previous)?;

        info!("Contact '{}' successfully added", name);
        Ok(Status::Applied)
    }

    /// Removes the contact with exactly this name.
    pub fn remove(&mut self, name: &str) -> Result<Status> {
        let Some(index) = self.position(name) else {
            debug!("Contact {} not found for removal", name);
            return Ok(Status::NotFound);
        };

        let previous = self.contacts.clone();
        self.contacts.remove(index);
        self.commit(previous)?;

        info!("Contact {} successfully deleted", name);
        Ok(Status::Applied)
    }

    /// Replaces the contact called `name` with `updated`, keeping its position.
    ///
    /// Renaming onto another existing contact is refused with
    /// [`Status::Duplicate`].
    pub fn edit(&mut self, name: &str, updated: Contact) -> Result<Status> {
        let Some(index) = self.position(name) else {
            debug!("Contact with the name {} not found", name);
            return Ok(Status::NotFound);
        };

        updated.validate()?;

        if updated.name() != name && self.get(updated.name()).is_some() {
            warn!(
                "Cannot rename {} to '{}': name already taken",
                name,
                updated.name()
            );
            return Ok(Status::Duplicate);
        }

        let previous = self.contacts.clone();
        self.contacts[index] = updated;
        self.commit(previous)?;

        info!("Contact {} updated successfully", name);
        Ok(Status::Applied)
    }

    pub fn get(&self, name: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.name() == name)
    }

    /// Contacts whose name contains `query`, ignoring case.
    ///
    /// The query is matched as plain text; regex metacharacters have no
    /// special meaning.
    pub fn search_by_name(&self, query: &str) -> Result<Vec<&Contact>> {
        let matcher = literal_matcher(query, "name")?;
        Ok(self
            .contacts
            .iter()
            .filter(|c| matcher.is_match(c.name()))
            .collect())
    }

    /// Contacts whose email contains `query`.
    pub fn search_by_email(&self, query: &str) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|c| c.email().contains(query))
            .collect()
    }

    /// Contacts whose phone number contains `query`.
    pub fn search_by_phone(&self, query: &str) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|c| c.phone_number().contains(query))
            .collect()
    }

    /// Birthdays occurring within `window_days` days from today.
    pub fn upcoming_birthdays(&self, window_days: i64) -> Vec<UpcomingBirthday> {
        self.upcoming_birthdays_from(Local::now().date_naive(), window_days)
    }

    /// Birthdays occurring between `today` and `today + window_days`, inclusive.
    ///
    /// A birthday that already passed this year counts for next year.
    /// Results follow storage order.
    pub fn upcoming_birthdays_from(
        &self,
        today: NaiveDate,
        window_days: i64,
    ) -> Vec<UpcomingBirthday> {
        if window_days < 0 {
            return Vec::new();
        }

        let horizon = today
            .checked_add_days(Days::new(window_days as u64))
            .unwrap_or(NaiveDate::MAX);

        self.contacts
            .iter()
            .filter_map(|contact| {
                let mut next = birthday_in_year(contact.birthday(), today.year());
                if next < today {
                    next = birthday_in_year(contact.birthday(), today.year() + 1);
                }

                (next <= horizon).then(|| UpcomingBirthday {
                    name: contact.name().to_string(),
                    congratulation_date: next,
                })
            })
            .collect()
    }

    /// The live contact list in storage order.
    pub fn all(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.contacts.iter().position(|c| c.name() == name)
    }

    /// Persists the list, restoring `previous` if the write fails.
    fn commit(&mut self, previous: Vec<Contact>) -> Result<()> {
        if let Err(e) = self.storage.save(&self.contacts) {
            error!("Failed to persist contacts, changes rolled back: {}", e);
            self.contacts = previous;
            return Err(e);
        }
        Ok(())
    }
}

/// Moves `birthday` into `year`; 29 February becomes 28 February in common years.
fn birthday_in_year(birthday: NaiveDate, year: i32) -> NaiveDate {
    birthday
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
        .unwrap_or(birthday)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> ContactManager {
        ContactManager::new(Storage::new(dir.path().join("contacts.json")))
    }

    fn contact(name: &str, birthday: &str) -> Contact {
        Contact::new(name, "Kyiv", "0501234567", "ann@example.com", birthday).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_rejects_duplicate_names() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);

        assert_eq!(contacts.add(contact("Ann", "01.01.1990")).unwrap(), Status::Applied);
        assert_eq!(
            contacts.add(contact("Ann", "02.02.1992")).unwrap(),
            Status::Duplicate
        );
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts.all()[0].birthday_string(), "01.01.1990");
    }

    #[test]
    fn mutations_are_persisted() {
        let dir = TempDir::new().unwrap();
        {
            let mut contacts = manager(&dir);
            contacts.add(contact("Ann", "01.01.1990")).unwrap();
            contacts.add(contact("Bob", "01.01.1991")).unwrap();
            contacts.remove("Ann").unwrap();
        }
        let reopened = manager(&dir);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.all()[0].name(), "Bob");
    }

    #[test]
    fn remove_twice_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);
        contacts.add(contact("Ann", "01.01.1990")).unwrap();

        assert_eq!(contacts.remove("Ann").unwrap(), Status::Applied);
        assert_eq!(contacts.remove("Ann").unwrap(), Status::NotFound);
        assert!(contacts.is_empty());
    }

    #[test]
    fn remove_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);
        contacts.add(contact("Ann", "01.01.1990")).unwrap();
        assert_eq!(contacts.remove("ann").unwrap(), Status::NotFound);
        assert_eq!(contacts.len(), 1);
    }

    #[test]
    fn edit_replaces_in_place() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);
        contacts.add(contact("Ann", "01.01.1990")).unwrap();
        contacts.add(contact("Bob", "01.01.1991")).unwrap();

        let mut updated = contacts.get("Ann").unwrap().clone();
        updated.set_email("ann@new.org").unwrap();
        assert_eq!(contacts.edit("Ann", updated).unwrap(), Status::Applied);
        assert_eq!(contacts.all()[0].email(), "ann@new.org");

        let missing = contact("Zed", "01.01.1990");
        assert_eq!(contacts.edit("Zed", missing).unwrap(), Status::NotFound);
    }

    #[test]
    fn edit_refuses_rename_onto_existing_contact() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);
        contacts.add(contact("Ann", "01.01.1990")).unwrap();
        contacts.add(contact("Bob", "01.01.1991")).unwrap();

        let renamed = contact("Bob", "01.01.1990");
        assert_eq!(contacts.edit("Ann", renamed).unwrap(), Status::Duplicate);
        assert_eq!(contacts.all()[0].name(), "Ann");
    }

    #[test]
    fn search_by_name_is_case_insensitive_and_literal() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);
        contacts.add(contact("Ann", "01.01.1990")).unwrap();
        contacts.add(contact("Joanna", "01.01.1990")).unwrap();
        contacts.add(contact("A.n", "01.01.1990")).unwrap();

        let names: Vec<&str> = contacts
            .search_by_name("AN")
            .unwrap()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, ["Ann", "Joanna"]);

        let dotted = contacts.search_by_name(".").unwrap();
        assert_eq!(dotted.len(), 1);
        assert!(contacts.search_by_name("  ").is_err());
    }

    #[test]
    fn search_by_email_and_phone_use_containment() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);
        contacts
            .add(Contact::new("Ann", "", "0501234567", "ann@mail.com", "01.01.1990").unwrap())
            .unwrap();
        contacts
            .add(Contact::new("Bob", "", "+380671112233", "bob@work.org", "01.01.1990").unwrap())
            .unwrap();

        assert_eq!(contacts.search_by_email("work").len(), 1);
        assert_eq!(contacts.search_by_email("@").len(), 2);
        assert_eq!(contacts.search_by_phone("067")[0].name(), "Bob");
        assert!(contacts.search_by_phone("999").is_empty());
    }

    #[test]
    fn birthday_window_is_inclusive() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);
        contacts.add(contact("Today", "16.10.1990")).unwrap();
        contacts.add(contact("Edge", "23.10.1985")).unwrap();
        contacts.add(contact("Outside", "24.10.1985")).unwrap();
        contacts.add(contact("Passed", "15.10.1980")).unwrap();

        let upcoming = contacts.upcoming_birthdays_from(date(2026, 10, 16), 7);
        let names: Vec<&str> = upcoming.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["Today", "Edge"]);
        assert_eq!(upcoming[0].congratulation_date, date(2026, 10, 16));
    }

    #[test]
    fn birthday_rolls_over_year_end() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);
        contacts.add(contact("NewYear", "02.01.1990")).unwrap();

        let upcoming = contacts.upcoming_birthdays_from(date(2026, 12, 29), 7);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].congratulation_date, date(2027, 1, 2));
    }

    #[test]
    fn leap_day_birthday_falls_back_to_february_28() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);
        contacts.add(contact("Leap", "29.02.1992")).unwrap();

        let upcoming = contacts.upcoming_birthdays_from(date(2027, 2, 25), 7);
        assert_eq!(upcoming[0].congratulation_date, date(2027, 2, 28));
        assert!(contacts.upcoming_birthdays_from(date(2027, 2, 25), -1).is_empty());
    }

    #[test]
    fn failed_save_rolls_back_every_mutation() {
        let dir = TempDir::new().unwrap();
        let mut contacts = manager(&dir);
        contacts.add(contact("Ann", "01.01.1990")).unwrap();
        let before = contacts.all().to_vec();

        // A directory in place of the data file makes every save fail.
        let path = dir.path().join("contacts.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(contacts.add(contact("Bob", "02.02.1992")).is_err());
        assert!(contacts.remove("Ann").is_err());
        let mut renamed = contact("Ann", "01.01.1990");
        renamed.set_address("Lviv");
        assert!(contacts.edit("Ann", renamed).is_err());

        assert_eq!(contacts.all(), before.as_slice());
    }
}
