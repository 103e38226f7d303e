use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    error::UserError,
    model::UserProfile,
    repo::{NewUser, UserStore},
};
use crate::{
    auth::{
        password::{hash_password, verify_password},
        services::{change_password, is_valid_email, normalize_email},
    },
    pagination::{Page, PageRequest},
};

pub const STATUS_ACTIVE: &str = "User status changed to active.";
pub const STATUS_INACTIVE: &str = "User status changed to inactive.";

pub async fn get_user(store: &dyn UserStore, id: Uuid) -> Result<UserProfile, UserError> {
    store.find_by_id(id).await?.ok_or(UserError::NotFound)
}

/// Flips the active flag and returns the new value with a message describing it.
#[instrument(skip(store, user), fields(user_id = %user.id))]
pub async fn toggle_active_status(
    store: &dyn UserStore,
    user: &UserProfile,
) -> Result<(bool, &'static str), UserError> {
    let updated = store
        .toggle_active(user.id)
        .await?
        .ok_or(UserError::NotFound)?;
    let message = if updated.is_active {
        STATUS_ACTIVE
    } else {
        STATUS_INACTIVE
    };
    info!(is_active = updated.is_active, "user status toggled");
    Ok((updated.is_active, message))
}

/// Self-service password change; the stored hash is untouched when `old_password` is wrong.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_user_password(
    store: &dyn UserStore,
    user: &UserProfile,
    old_password: &str,
    new_password: &str,
) -> Result<(), UserError> {
    if !verify_password(old_password, &user.password_hash)? {
        warn!("old password mismatch");
        return Err(UserError::IncorrectPassword);
    }
    change_password(store, user, new_password).await?;
    Ok(())
}

pub async fn list_users(
    store: &dyn UserStore,
    req: &PageRequest,
) -> Result<Page<UserProfile>, UserError> {
    store.list(req).await
}

#[derive(Debug)]
pub enum SeedOutcome {
    Created(UserProfile),
    AlreadyExists,
}

/// Creates the first admin account; does nothing once any admin exists.
pub async fn seed_admin(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<SeedOutcome, UserError> {
    if store.count_admins().await? > 0 {
        info!("admin already exists");
        return Ok(SeedOutcome::AlreadyExists);
    }

    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(UserError::Validation("Invalid email".into()));
    }
    let hash = hash_password(password)?;
    let admin = store
        .create(NewUser {
            name: "Admin",
            surname: "Admin",
            email: &email,
            password_hash: &hash,
            is_admin: true,
        })
        .await?;
    info!(user_id = %admin.id, email = %admin.email, "admin user created");
    Ok(SeedOutcome::Created(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::MemoryUserStore;

    async fn create_user(store: &MemoryUserStore, email: &str, password: &str) -> UserProfile {
        let hash = hash_password(password).unwrap();
        store
            .create(NewUser {
                name: "John",
                surname: "Doe",
                email,
                password_hash: &hash,
                is_admin: false,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn get_user_missing_is_not_found() {
        let store = MemoryUserStore::new();
        let err = get_user(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }

    #[tokio::test]
    async fn toggling_twice_restores_the_flag() {
        let store = MemoryUserStore::new();
        let user = create_user(&store, "john@doe.com", "pw").await;

        let (status, message) = toggle_active_status(&store, &user).await.unwrap();
        assert!(!status);
        assert_eq!(message, "User status changed to inactive.");

        let (status, message) = toggle_active_status(&store, &user).await.unwrap();
        assert!(status);
        assert_eq!(message, "User status changed to active.");

        assert!(get_user(&store, user.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn wrong_old_password_leaves_hash_unchanged() {
        let store = MemoryUserStore::new();
        let user = create_user(&store, "john@doe.com", "old-pw").await;

        let err = update_user_password(&store, &user, "nope", "new-pw")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::IncorrectPassword));
        assert_eq!(err.to_string(), "Old password is incorrect.");

        let stored = get_user(&store, user.id).await.unwrap();
        assert_eq!(stored.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn correct_old_password_updates_hash() {
        let store = MemoryUserStore::new();
        let user = create_user(&store, "john@doe.com", "old-pw").await;

        update_user_password(&store, &user, "old-pw", "new-pw")
            .await
            .unwrap();

        let stored = get_user(&store, user.id).await.unwrap();
        assert!(verify_password("new-pw", &stored.password_hash).unwrap());
        assert!(!verify_password("old-pw", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn seed_admin_runs_once() {
        let store = MemoryUserStore::new();
        let outcome = seed_admin(&store, "Root@Example.com", "change-me").await.unwrap();
        let SeedOutcome::Created(admin) = outcome else {
            panic!("expected a new admin");
        };
        assert!(admin.is_admin);
        assert_eq!(admin.email, "root@example.com");
        assert_eq!(admin.name, "Admin");

        let again = seed_admin(&store, "other@example.com", "x").await.unwrap();
        assert!(matches!(again, SeedOutcome::AlreadyExists));
        assert_eq!(store.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_users_pages_through_store() {
        let store = MemoryUserStore::new();
        for i in 0..25 {
            let email = format!("user{i:02}@doe.com");
            store
                .create(NewUser {
                    name: "John",
                    surname: "Doe",
                    email: &email,
                    password_hash: "not-hashed",
                    is_admin: false,
                })
                .await
                .unwrap();
        }
        let req = PageRequest {
            page: 3,
            per_page: 10,
            sort_field: "email".into(),
            ..PageRequest::default()
        };
        let page = list_users(&store, &req).await.unwrap();
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.total_entries, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.rows[0].email, "user20@doe.com");
    }
}
