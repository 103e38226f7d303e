use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::UserProfile;
use crate::pagination::{Page, PageRequest};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<UserProfile> for ProfileResponse {
    fn from(u: UserProfile) -> Self {
        Self {
            id: u.id,
            name: u.name,
            surname: u.surname,
            email: u.email,
            is_admin: u.is_admin,
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    10
}

fn default_sort_field() -> String {
    "name".into()
}

fn default_sort_order() -> String {
    "asc".into()
}

fn default_filters() -> String {
    r#"{"is_active": true}"#.into()
}

/// Query string of the admin user listing. `filters` is a JSON object encoded as a string.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    #[serde(default = "default_sort_field")]
    pub sort_field: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default)]
    pub search: String,
    #[serde(default = "default_filters")]
    pub filters: String,
}

impl TryFrom<UserListParams> for PageRequest {
    type Error = String;

    fn try_from(p: UserListParams) -> Result<Self, Self::Error> {
        let filters = if p.filters.trim().is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(&p.filters) {
                Ok(Value::Object(map)) => map,
                Ok(_) => return Err("Filters must be a JSON object.".into()),
                Err(e) => return Err(format!("Invalid filters: {e}")),
            }
        };
        Ok(PageRequest {
            page: p.page,
            per_page: p.per_page,
            sort_field: p.sort_field,
            sort_order: p.sort_order,
            search: p.search,
            filters,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<ProfileResponse>,
    pub total_entries: i64,
    pub total_pages: i64,
}

impl From<Page<UserProfile>> for UserListResponse {
    fn from(page: Page<UserProfile>) -> Self {
        Self {
            users: page.rows.into_iter().map(ProfileResponse::from).collect(),
            total_entries: page.total_entries,
            total_pages: page.total_pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleStatusResponse {
    pub message: &'static str,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct IsActiveResponse {
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminChangePasswordRequest {
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(query: Value) -> UserListParams {
        serde_json::from_value(query).expect("valid params")
    }

    #[test]
    fn defaults_list_active_users_by_name() {
        let req = PageRequest::try_from(params(json!({}))).unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 10);
        assert_eq!(req.sort_field, "name");
        assert_eq!(req.sort_order, "asc");
        assert_eq!(req.search, "");
        assert_eq!(req.filters.get("is_active"), Some(&Value::Bool(true)));
    }

    #[test]
    fn empty_filters_string_means_no_filters() {
        let req = PageRequest::try_from(params(json!({"filters": ""}))).unwrap();
        assert!(req.filters.is_empty());
    }

    #[test]
    fn unparsable_filters_are_rejected() {
        assert!(PageRequest::try_from(params(json!({"filters": "{oops"}))).is_err());
        let err = PageRequest::try_from(params(json!({"filters": "[1]"}))).unwrap_err();
        assert_eq!(err, "Filters must be a JSON object.");
    }
}
