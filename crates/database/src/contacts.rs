use app_error::{AppError, AppResult};
use app_models::Contact;
use serde_json::json;
use tracing::debug;

use crate::{Database, DbService};

const CONTACTS_TABLE: &str = "contacts";

/// Contacts keyed by `contact_id`. Every read checks the owner, so a record
/// that belongs to someone else looks exactly like a missing one.
pub struct ContactRepository {
    contacts: DbService<Contact>,
}

impl ContactRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            contacts: DbService::new(db, CONTACTS_TABLE),
        }
    }

    pub async fn list(&self, owner: &str, skip: u32, limit: u32) -> AppResult<Vec<Contact>> {
        let sql = format!(
            "SELECT * FROM contacts WHERE owner = $owner ORDER BY last_name, first_name LIMIT {} START {}",
            limit, skip
        );
        self.contacts
            .run_custom_query(&sql, vec![("owner".to_string(), json!(owner))])
            .await
    }

    pub async fn all_for_owner(&self, owner: &str) -> AppResult<Vec<Contact>> {
        self.contacts.get_records_by_field("owner", owner.to_string()).await
    }

    pub async fn get(&self, owner: &str, id: &str) -> AppResult<Contact> {
        match self.contacts.get_record_by_id(id).await? {
            Some(contact) if contact.owner == owner => Ok(contact),
            _ => Err(AppError::resource_not_found("Contact", id)),
        }
    }

    pub async fn create(&self, contact: Contact) -> AppResult<Contact> {
        let id = contact.contact_id.clone();
        self.contacts
            .create_record(&id, contact)
            .await?
            .ok_or_else(|| {
                AppError::DatabaseError(anyhow::anyhow!("Database did not return stored contact"))
            })
    }

    /// Store `contact` over the existing record with the same id
    pub async fn replace(&self, contact: Contact) -> AppResult<Contact> {
        let id = contact.contact_id.clone();
        self.get(&contact.owner, &id).await?;

        self.contacts
            .update_record(&id, contact)
            .await?
            .ok_or_else(|| AppError::resource_not_found("Contact", &id))
    }

    pub async fn delete(&self, owner: &str, id: &str) -> AppResult<Contact> {
        self.get(owner, id).await?;
        debug!("Deleting contact {} of {}", id, owner);

        self.contacts
            .delete_record(id)
            .await?
            .ok_or_else(|| AppError::resource_not_found("Contact", id))
    }

    /// Case-insensitive substring match on names and email
    pub async fn search(&self, owner: &str, query: &str) -> AppResult<Vec<Contact>> {
        let needle = query.trim().to_lowercase();
        self.contacts
            .run_custom_query(
                "SELECT * FROM contacts WHERE owner = $owner AND (\
                 string::contains(string::lowercase(first_name), $needle) \
                 OR string::contains(string::lowercase(last_name), $needle) \
                 OR string::contains(string::lowercase(email), $needle)) \
                 ORDER BY last_name, first_name",
                vec![
                    ("owner".to_string(), json!(owner)),
                    ("needle".to_string(), json!(needle)),
                ],
            )
            .await
    }
}
