use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classes::dto::ClassView;
use crate::roles::Role;
use crate::users::repo::{User, UserViewRow};

/// Request-scoped projection of a user: persisted fields plus the resolved
/// role and, on the details view, the resolved classes. Never persisted.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image_uri: String,
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_classes: Option<Vec<ClassView>>,
}

impl From<UserViewRow> for UserView {
    fn from(row: UserViewRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            image_uri: row.image_uri,
            role: row.role.and_then(|l| l.parse().ok()),
            school_classes: None,
        }
    }
}

impl UserView {
    pub fn from_user(user: User, role: Option<Role>) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            image_uri: user.image_uri,
            role,
            school_classes: None,
        }
    }
}

/// Form body shared by create and edit.
#[derive(Debug, Deserialize)]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
}
