use crate::error::{StoreError, StoreResult};
use crate::model::{Assignee, UserProfile};
use crate::storage::SharedStorage;

pub const USERS_COLLECTION: &str = "users";

/// Read access to the `users` collection, for assignment targets and
/// resolving callers.
#[derive(Clone)]
pub struct UserDirectory {
    storage: SharedStorage,
}

impl UserDirectory {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn get(&self, user_id: &str) -> StoreResult<UserProfile> {
        let document = self
            .storage
            .read(&[USERS_COLLECTION, user_id])
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{USERS_COLLECTION}/{user_id}")))?;
        parse_profile(user_id, document)
    }

    pub async fn list(&self) -> StoreResult<Vec<UserProfile>> {
        let mut profiles = Vec::new();
        for id in self.storage.list(&[USERS_COLLECTION]).await? {
            if let Some(document) = self.storage.read(&[USERS_COLLECTION, &id]).await? {
                profiles.push(parse_profile(&id, document)?);
            }
        }
        Ok(profiles)
    }

    /// Non-admin users ordered by last name, then first name.
    pub async fn list_workers(&self) -> StoreResult<Vec<UserProfile>> {
        let mut workers: Vec<UserProfile> = self
            .list()
            .await?
            .into_iter()
            .filter(|profile| !profile.is_admin)
            .collect();
        workers.sort_by(|a, b| {
            (a.last_name.to_lowercase(), a.first_name.to_lowercase())
                .cmp(&(b.last_name.to_lowercase(), b.first_name.to_lowercase()))
        });
        Ok(workers)
    }

    /// Choices for an assignment selector.
    pub async fn assignees(&self) -> StoreResult<Vec<Assignee>> {
        Ok(self
            .list_workers()
            .await?
            .iter()
            .map(UserProfile::assignee)
            .collect())
    }

    pub async fn put(&self, profile: &UserProfile) -> StoreResult<()> {
        let value = serde_json::to_value(profile)
            .map_err(|error| StoreError::Serialization(error.to_string()))?;
        self.storage
            .write(&[USERS_COLLECTION, profile.id.as_str()], &value)
            .await
    }
}

fn parse_profile(id: &str, document: serde_json::Value) -> StoreResult<UserProfile> {
    let mut profile: UserProfile = serde_json::from_value(document)
        .map_err(|error| StoreError::Serialization(format!("{USERS_COLLECTION}/{id}: {error}")))?;
    if profile.id.is_empty() {
        profile.id = id.to_string();
    }
    Ok(profile)
}
