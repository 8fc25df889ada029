use serde::{Deserialize, Serialize};

use super::assignee::Assignee;

/// A document from the `users` collection. Read-only to the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

impl UserProfile {
    pub fn assignee(&self) -> Assignee {
        Assignee::new(self.first_name.clone(), self.last_name.clone())
    }

    pub fn role(&self) -> Role {
        if self.is_admin {
            Role::Admin
        } else {
            Role::Worker
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Worker,
}

/// Who is performing an operation. Passed explicitly into every call that
/// depends on role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
    pub identity: Assignee,
}

impl Caller {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.id.clone(),
            role: profile.role(),
            identity: profile.assignee(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
