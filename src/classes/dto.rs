use serde::Serialize;
use uuid::Uuid;

use crate::classes::repo::SchoolClass;

#[derive(Debug, Clone, Serialize)]
pub struct ClassView {
    pub id: Uuid,
    pub name: String,
    pub teacher_id: Option<Uuid>,
}

impl From<SchoolClass> for ClassView {
    fn from(c: SchoolClass) -> Self {
        Self {
            id: c.id,
            name: c.name,
            teacher_id: c.teacher_id,
        }
    }
}
