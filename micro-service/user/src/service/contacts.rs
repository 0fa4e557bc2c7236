use app_database::ContactRepository;
use app_error::{AppError, AppResult};
use app_middleware::validation::validate_contact;
use app_models::{
    Contact, ContactInput,
    contact::{ContactListQuery, MAX_PAGE_LIMIT},
};
use chrono::{NaiveDate, Utc};
use tracing::info;

/// Longest window `upcoming_birthdays` accepts
pub const MAX_BIRTHDAY_WINDOW: u32 = 366;

/// Owner-scoped contact book. `owner` is always the caller's email.
pub struct ContactService {
    contacts: ContactRepository,
}

impl ContactService {
    pub fn new(contacts: ContactRepository) -> Self {
        Self { contacts }
    }

    pub async fn list(&self, owner: &str, query: ContactListQuery) -> AppResult<Vec<Contact>> {
        let limit = query.limit.clamp(1, MAX_PAGE_LIMIT);
        self.contacts.list(owner, query.skip, limit).await
    }

    pub async fn get(&self, owner: &str, id: &str) -> AppResult<Contact> {
        self.contacts.get(owner, id).await
    }

    pub async fn create(&self, owner: &str, input: ContactInput) -> AppResult<Contact> {
        let contact = Contact::new(owner, validate_contact(input)?);
        let stored = self.contacts.create(contact).await?;
        info!("Contact {} created for {}", stored.contact_id, owner);
        Ok(stored)
    }

    pub async fn update(&self, owner: &str, id: &str, input: ContactInput) -> AppResult<Contact> {
        let input = validate_contact(input)?;
        let mut contact = self.contacts.get(owner, id).await?;
        contact.apply(input);
        self.contacts.replace(contact).await
    }

    pub async fn remove(&self, owner: &str, id: &str) -> AppResult<Contact> {
        let removed = self.contacts.delete(owner, id).await?;
        info!("Contact {} removed for {}", id, owner);
        Ok(removed)
    }

    pub async fn search(&self, owner: &str, query: &str) -> AppResult<Vec<Contact>> {
        if query.trim().is_empty() {
            return Err(AppError::validation("q", "Search query cannot be empty"));
        }
        self.contacts.search(owner, query).await
    }

    pub async fn upcoming_birthdays(&self, owner: &str, days: u32) -> AppResult<Vec<Contact>> {
        if days > MAX_BIRTHDAY_WINDOW {
            return Err(AppError::validation(
                "days",
                &format!("must not exceed {}", MAX_BIRTHDAY_WINDOW),
            ));
        }

        let contacts = self.contacts.all_for_owner(owner).await?;
        Ok(birthdays_within(contacts, Utc::now().date_naive(), days))
    }
}

/// Contacts whose next birthday is at most `days` days after `today`,
/// soonest first
pub fn birthdays_within(contacts: Vec<Contact>, today: NaiveDate, days: u32) -> Vec<Contact> {
    let mut upcoming: Vec<(NaiveDate, Contact)> = contacts
        .into_iter()
        .map(|contact| (contact.next_birthday(today), contact))
        .filter(|(next, _)| (*next - today).num_days() <= i64::from(days))
        .collect();

    upcoming.sort_by(|(a, first), (b, second)| {
        a.cmp(b)
            .then_with(|| first.last_name.cmp(&second.last_name))
            .then_with(|| first.first_name.cmp(&second.first_name))
    });

    upcoming.into_iter().map(|(_, contact)| contact).collect()
}
