use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::{FieldDef, FieldValue, Paginated};

/// User profile record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub is_admin: bool,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub const USER_COLUMNS: &str =
    "id, name, surname, email, password_hash, is_admin, is_active, created_at, updated_at";

static USER_FIELDS: &[FieldDef] = &[
    FieldDef::uuid("id", "id"),
    FieldDef::text("name", "name"),
    FieldDef::text("surname", "surname"),
    FieldDef::text("email", "email"),
    FieldDef::text("password", "password_hash").secret(),
    FieldDef::boolean("is_admin", "is_admin"),
    FieldDef::boolean("is_active", "is_active"),
    FieldDef::timestamp("created_at", "created_at"),
    FieldDef::timestamp("updated_at", "updated_at"),
];

impl Paginated for UserProfile {
    const TABLE: &'static str = "user_profiles";
    const KEY: &'static str = "id";

    fn fields() -> &'static [FieldDef] {
        USER_FIELDS
    }

    fn value_of(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "id" => FieldValue::Uuid(self.id),
            "name" => FieldValue::Text(self.name.clone()),
            "surname" => FieldValue::Text(self.surname.clone()),
            "email" => FieldValue::Text(self.email.clone()),
            "password" => FieldValue::Text(self.password_hash.clone()),
            "is_admin" => FieldValue::Bool(self.is_admin),
            "is_active" => FieldValue::Bool(self.is_active),
            "created_at" => FieldValue::Timestamp(self.created_at),
            "updated_at" => FieldValue::Timestamp(self.updated_at),
            _ => return None,
        };
        Some(value)
    }
}
