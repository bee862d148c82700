//! Contact record and its field validation.
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::{PaError, Record, Result};

/// Birthday format used for input, display and storage
pub const BIRTHDAY_FORMAT: &str = "%d.%m.%Y";

// Optional +380 country code, optional single leading zero, 9-12 digits.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\+380)?0?\d{9,12}$").expect("valid phone regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// A person in the address book. The name is the lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    name: String,
    address: String,
    phone_number: String,
    email: String,
    #[serde(serialize_with = "serialize_birthday")]
    birthday: NaiveDate,
}

/// Stored shape of a contact before validation
#[derive(Debug, Deserialize)]
struct ContactData {
    name: String,
    address: String,
    phone_number: String,
    email: String,
    birthday: String,
}

impl Contact {
    /// Creates a contact, validating every field.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        phone_number: impl Into<String>,
        email: impl Into<String>,
        birthday: &str,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PaError::EmptyField { field: "Name" });
        }

        let phone_number = phone_number.into();
        validate_phone_number(&phone_number)?;

        let email = email.into();
        validate_email(&email)?;

        Ok(Self {
            name,
            address: address.into(),
            phone_number,
            email,
            birthday: parse_birthday(birthday)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn birthday(&self) -> NaiveDate {
        self.birthday
    }

    /// Birthday formatted as `DD.MM.YYYY`
    pub fn birthday_string(&self) -> String {
        self.birthday.format(BIRTHDAY_FORMAT).to_string()
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    pub fn set_phone_number(&mut self, phone_number: impl Into<String>) -> Result<()> {
        let phone_number = phone_number.into();
        validate_phone_number(&phone_number)?;
        self.phone_number = phone_number;
        Ok(())
    }

    pub fn set_email(&mut self, email: impl Into<String>) -> Result<()> {
        let email = email.into();
        validate_email(&email)?;
        self.email = email;
        Ok(())
    }

    pub fn set_birthday(&mut self, birthday: &str) -> Result<()> {
        self.birthday = parse_birthday(birthday)?;
        Ok(())
    }

    /// Re-checks the phone number and email shape.
    pub fn validate(&self) -> Result<()> {
        validate_phone_number(&self.phone_number)?;
        validate_email(&self.email)
    }
}

impl Record for Contact {
    const KIND: &'static str = "contact";
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["name", "address", "phone_number", "email", "birthday"];

    fn from_raw(raw: Value) -> Result<Self> {
        let data: ContactData =
            serde_json::from_value(raw).map_err(|e| PaError::InvalidRecord {
                kind: Self::KIND,
                message: e.to_string(),
            })?;

        Contact::new(
            data.name,
            data.address,
            data.phone_number,
            data.email,
            &data.birthday,
        )
    }

    fn to_raw(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

pub fn validate_phone_number(phone_number: &str) -> Result<()> {
    if PHONE_RE.is_match(phone_number) {
        Ok(())
    } else {
        Err(PaError::InvalidPhoneNumber {
            value: phone_number.to_string(),
        })
    }
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(PaError::EmptyField {
            field: "Email address",
        });
    }
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(PaError::InvalidEmail {
            value: email.to_string(),
        })
    }
}

/// Parses a `DD.MM.YYYY` birthday that is not later than today.
pub fn parse_birthday(value: &str) -> Result<NaiveDate> {
    let date = NaiveDate::parse_from_str(value.trim(), BIRTHDAY_FORMAT).map_err(|_| {
        PaError::InvalidBirthday {
            value: value.to_string(),
            reason: "Expected format: DD.MM.YYYY".to_string(),
        }
    })?;

    if date > Local::now().date_naive() {
        return Err(PaError::InvalidBirthday {
            value: value.to_string(),
            reason: "Birthday cannot be in the future".to_string(),
        });
    }
    Ok(date)
}

fn serialize_birthday<S: Serializer>(
    date: &NaiveDate,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format(BIRTHDAY_FORMAT).to_string())
}
