//! Authentication service.
//!
//! Password registration and login, plus the bearer tokens that carry a
//! user's identity on every cart and seller request.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, IssuedToken, TokenSigner};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use zaulimi_core::{Email, Role, UserId};

use crate::models::User;
use crate::store::{RepositoryError, UserStore};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
///
/// Borrows the user store and token signer from application state for the
/// duration of one request.
pub struct AuthService<'a> {
    users: &'a UserStore,
    tokens: &'a TokenSigner,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a UserStore, tokens: &'a TokenSigner) -> Self {
        Self { users, tokens }
    }

    /// Register a new user and sign them in.
    ///
    /// A missing role registers a buyer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName`, `AuthError::InvalidEmail`,
    /// `AuthError::WeakPassword`, or `AuthError::InvalidRole` for bad input,
    /// and `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<(User, IssuedToken), AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::InvalidName);
        }
        let email = Email::parse(email)?;
        validate_password(password)?;
        let role = role.map(str::parse::<Role>).transpose()?.unwrap_or_default();

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other @ RepositoryError::IdsExhausted => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        let token = self.tokens.issue(&user)?;
        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is malformed and
    /// `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, IssuedToken), AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.tokens.issue(&user)?;
        Ok((user, token))
    }

    /// Resolve a bearer token to the user it names.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` or `AuthError::TokenExpired` if the
    /// token does not verify, and `AuthError::UserNotFound` if the user is gone.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;
        self.get_user(claims.sub).await
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;

    fn fixtures() -> (UserStore, TokenSigner) {
        (
            UserStore::new(),
            TokenSigner::new(
                SecretString::from("k8Zq2vLr9TfX4mWp7YhBn3CjD6sGa1Ue"),
                Duration::from_secs(3600),
            ),
        )
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (users, tokens) = fixtures();
        let auth = AuthService::new(&users, &tokens);

        let (user, issued) = auth
            .register(" Chikondi ", "Chikondi@Zaulimi24.mw", "maize123", None)
            .await
            .unwrap();
        assert_eq!(user.name, "Chikondi");
        assert_eq!(user.email.as_str(), "chikondi@zaulimi24.mw");
        assert_eq!(user.role, Role::Buyer);
        assert_eq!(auth.authenticate(&issued.token).await.unwrap(), user);

        let (again, _) = auth
            .login("chikondi@zaulimi24.mw", "maize123")
            .await
            .unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let (users, tokens) = fixtures();
        let auth = AuthService::new(&users, &tokens);

        assert!(matches!(
            auth.register("  ", "a@zaulimi24.mw", "maize123", None).await,
            Err(AuthError::InvalidName)
        ));
        assert!(matches!(
            auth.register("A", "not-an-email", "maize123", None).await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.register("A", "a@zaulimi24.mw", "12345", None).await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            auth.register("A", "a@zaulimi24.mw", "maize123", Some("admin")).await,
            Err(AuthError::InvalidRole(_))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (users, tokens) = fixtures();
        let auth = AuthService::new(&users, &tokens);

        auth.register("A", "a@zaulimi24.mw", "maize123", Some("seller"))
            .await
            .unwrap();
        assert!(matches!(
            auth.register("B", "A@zaulimi24.mw", "maize123", None).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (users, tokens) = fixtures();
        let auth = AuthService::new(&users, &tokens);
        auth.register("A", "a@zaulimi24.mw", "maize123", None)
            .await
            .unwrap();

        for (email, password) in [
            ("a@zaulimi24.mw", "wrong-password"),
            ("nobody@zaulimi24.mw", "maize123"),
        ] {
            assert!(matches!(
                auth.login(email, password).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
        assert!(matches!(
            auth.login("garbage", "maize123").await,
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("maize123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("maize123", &hash).is_ok());
        assert!(verify_password("maize124", &hash).is_err());
    }
}
