use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    error::UserError,
    model::{UserProfile, USER_COLUMNS},
};
use crate::pagination::{get_rows, Page, PageRequest, PgRows};

/// Fields of a profile about to be inserted; `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub surname: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, UserError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, UserError>;
    /// Fails with `UserError::Conflict` when the email is taken.
    async fn create(&self, user: NewUser<'_>) -> Result<UserProfile, UserError>;
    /// Flips `is_active` in place; `None` when the user does not exist.
    async fn toggle_active(&self, id: Uuid) -> Result<Option<UserProfile>, UserError>;
    async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<UserProfile>, UserError>;
    async fn count_admins(&self) -> Result<i64, UserError>;
    async fn list(&self, req: &PageRequest) -> Result<Page<UserProfile>, UserError>;
    async fn ping(&self) -> Result<(), UserError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_insert_error(err: sqlx::Error) -> UserError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => UserError::Conflict,
        _ => UserError::Storage(err),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, UserError> {
        let user = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {USER_COLUMNS} FROM user_profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, UserError> {
        let user = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {USER_COLUMNS} FROM user_profiles WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser<'_>) -> Result<UserProfile, UserError> {
        sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            INSERT INTO user_profiles (name, surname, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.name)
        .bind(user.surname)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)
    }

    async fn toggle_active(&self, id: Uuid) -> Result<Option<UserProfile>, UserError> {
        let user = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE user_profiles
               SET is_active = NOT is_active, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<UserProfile>, UserError> {
        let user = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE user_profiles
               SET password_hash = $2, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn count_admins(&self) -> Result<i64, UserError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_profiles WHERE is_admin = TRUE",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn list(&self, req: &PageRequest) -> Result<Page<UserProfile>, UserError> {
        let mut rows = PgRows::<UserProfile>::acquire(&self.db).await?;
        Ok(get_rows(&mut rows, req).await?)
    }

    async fn ping(&self) -> Result<(), UserError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
