use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    error::UserError,
    model::UserProfile,
    repo::{NewUser, UserStore},
};
use crate::pagination::{get_rows, MemoryRows, Page, PageRequest};

/// Process-local user store backing `AppState::fake()`.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<UserProfile>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Option<UserProfile>
    where
        F: FnOnce(&mut UserProfile) + Send,
    {
        let mut users = self.users.write().await;
        let user = users.iter_mut().find(|u| u.id == id)?;
        apply(user);
        user.updated_at = OffsetDateTime::now_utc();
        Some(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, UserError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser<'_>) -> Result<UserProfile, UserError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(UserError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let profile = UserProfile {
            id: Uuid::new_v4(),
            name: user.name.to_string(),
            surname: user.surname.to_string(),
            email: user.email.to_string(),
            password_hash: user.password_hash.to_string(),
            is_admin: user.is_admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.push(profile.clone());
        Ok(profile)
    }

    async fn toggle_active(&self, id: Uuid) -> Result<Option<UserProfile>, UserError> {
        Ok(self.update(id, |u| u.is_active = !u.is_active).await)
    }

    async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<UserProfile>, UserError> {
        let hash = password_hash.to_string();
        Ok(self.update(id, move |u| u.password_hash = hash).await)
    }

    async fn count_admins(&self) -> Result<i64, UserError> {
        Ok(self.users.read().await.iter().filter(|u| u.is_admin).count() as i64)
    }

    async fn list(&self, req: &PageRequest) -> Result<Page<UserProfile>, UserError> {
        let snapshot = self.users.read().await.clone();
        let mut rows = MemoryRows::new(snapshot);
        Ok(get_rows(&mut rows, req).await?)
    }

    async fn ping(&self) -> Result<(), UserError> {
        Ok(())
    }
}
