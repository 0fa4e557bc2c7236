use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_BIRTHDAY_WINDOW: u32 = 7;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Contact {
    /// uuid v4 text, also the record key
    pub contact_id: String,
    /// Email of the owning user
    pub owner: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: NaiveDate,
    #[serde(default)]
    pub additional_data: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(owner: impl Into<String>, input: ContactInput) -> Self {
        let now = Utc::now();
        Self {
            contact_id: Uuid::new_v4().to_string(),
            owner: owner.into(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            birthday: input.birthday,
            additional_data: input.additional_data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every editable field, keeping identity and ownership
    pub fn apply(&mut self, input: ContactInput) {
        self.first_name = input.first_name;
        self.last_name = input.last_name;
        self.email = input.email;
        self.phone = input.phone;
        self.birthday = input.birthday;
        self.additional_data = input.additional_data;
        self.updated_at = Utc::now();
    }

    /// First anniversary of the birthday on or after `today`.
    /// 29 February falls on 28 February in common years.
    pub fn next_birthday(&self, today: NaiveDate) -> NaiveDate {
        let this_year = anniversary(self.birthday, today.year());
        if this_year >= today {
            this_year
        } else {
            anniversary(self.birthday, today.year() + 1)
        }
    }
}

fn anniversary(birthday: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day() - 1))
        .unwrap_or(birthday)
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContactInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: NaiveDate,
    #[serde(default)]
    pub additional_data: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContactResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: NaiveDate,
    pub additional_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Contact> for ContactResponse {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.contact_id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            phone: contact.phone,
            birthday: contact.birthday,
            additional_data: contact.additional_data,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ContactListQuery {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for ContactListQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContactSearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct BirthdayQuery {
    #[serde(default = "default_window")]
    pub days: u32,
}

fn default_window() -> u32 {
    DEFAULT_BIRTHDAY_WINDOW
}
