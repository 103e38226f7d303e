use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::password::{hash_password, verify_password};
use crate::users::{NewUser, UserError, UserProfile, UserStore};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration fields after payload validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

pub async fn register(store: &dyn UserStore, reg: Registration) -> Result<UserProfile, UserError> {
    let email = normalize_email(&reg.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(UserError::Validation("Invalid email".into()));
    }

    if store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(UserError::Conflict);
    }

    let hash = hash_password(&reg.password)?;
    let user = store
        .create(NewUser {
            name: reg.name.trim(),
            surname: reg.surname.trim(),
            email: &email,
            password_hash: &hash,
            is_admin: false,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

pub async fn login(store: &dyn UserStore, email: &str, password: &str) -> Result<UserProfile, UserError> {
    let email = normalize_email(email);
    let user = store.find_by_email(&email).await?.ok_or_else(|| {
        warn!(email = %email, "login unknown email");
        UserError::NotFound
    })?;

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login wrong password");
        return Err(UserError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

pub fn check_if_admin(user: &UserProfile) -> bool {
    user.is_admin
}

/// Replaces the stored hash without checking the previous password.
pub async fn change_password(
    store: &dyn UserStore,
    user: &UserProfile,
    new_password: &str,
) -> Result<UserProfile, UserError> {
    let hash = hash_password(new_password)?;
    let updated = store
        .set_password_hash(user.id, &hash)
        .await?
        .ok_or(UserError::NotFound)?;
    info!(user_id = %updated.id, "password changed");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::MemoryUserStore;

    fn registration(email: &str) -> Registration {
        Registration {
            name: "John".into(),
            surname: "Doe".into(),
            email: email.into(),
            password: "hunter22".into(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("john@doe.com"));
        assert!(!is_valid_email("john@doe"));
        assert!(!is_valid_email("john doe@mail.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn register_normalizes_and_hashes() {
        let store = MemoryUserStore::new();
        let user = register(&store, registration("  John@Doe.COM ")).await.unwrap();
        assert_eq!(user.email, "john@doe.com");
        assert!(!user.is_admin);
        assert!(user.is_active);
        assert_ne!(user.password_hash, "hunter22");
        assert!(verify_password("hunter22", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        register(&store, registration("john@doe.com")).await.unwrap();
        let err = register(&store, registration("JOHN@doe.com")).await.unwrap_err();
        assert!(matches!(err, UserError::Conflict));
    }

    #[tokio::test]
    async fn register_rejects_malformed_email() {
        let store = MemoryUserStore::new();
        let err = register(&store, registration("not-an-email")).await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn login_outcomes() {
        let store = MemoryUserStore::new();
        let user = register(&store, registration("john@doe.com")).await.unwrap();

        let ok = login(&store, "John@Doe.com", "hunter22").await.unwrap();
        assert_eq!(ok.id, user.id);

        let err = login(&store, "john@doe.com", "wrong").await.unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));

        let err = login(&store, "nobody@doe.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }

    #[tokio::test]
    async fn change_password_overwrites_hash() {
        let store = MemoryUserStore::new();
        let user = register(&store, registration("john@doe.com")).await.unwrap();
        let updated = change_password(&store, &user, "new-secret").await.unwrap();
        assert!(verify_password("new-secret", &updated.password_hash).unwrap());
        assert!(login(&store, "john@doe.com", "hunter22").await.is_err());
    }

    #[tokio::test]
    async fn admin_predicate_reads_flag() {
        let store = MemoryUserStore::new();
        let mut user = register(&store, registration("john@doe.com")).await.unwrap();
        assert!(!check_if_admin(&user));
        user.is_admin = true;
        assert!(check_if_admin(&user));
    }
}
