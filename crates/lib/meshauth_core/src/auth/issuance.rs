//! Issuance flows: register and login.

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use super::password::PasswordHasher;
use super::{AuthError, AuthService};
use crate::models::auth::{AuthSession, TokenClaims, User, UserRecord};

/// Minimum password length (characters).
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Basic syntactic email check.
pub fn valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

/// Shape validation for a registration request.
pub fn validate_registration(email: &str, password: &str, name: &str) -> Result<(), AuthError> {
    if !valid_email(email) {
        return Err(AuthError::ValidationError("A valid email is required".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::ValidationError(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if name.trim().is_empty() {
        return Err(AuthError::ValidationError("Name is required".into()));
    }
    Ok(())
}

/// Register a new user and issue a token bound to it.
///
/// The insert is final once the store confirms it; a token failure after
/// that point surfaces as an internal error without rolling back.
pub async fn register(
    auth: &AuthService,
    email: &str,
    password: &str,
    name: &str,
) -> Result<AuthSession, AuthError> {
    validate_registration(email, password, name)?;

    if auth.store.find_user_by_email(email).await?.is_some() {
        return Err(AuthError::AlreadyExists);
    }

    let hasher = auth.hasher.clone();
    let plaintext = password.to_string();
    let password_hash = run_blocking(move || hasher.hash(&plaintext)).await??;

    // A concurrent insert of the same email surfaces as Conflict → AlreadyExists.
    let user = auth
        .store
        .insert_user(email, &password_hash, name.trim())
        .await?;

    let token = auth.codec.issue(&TokenClaims::for_user(&user), auth.policy.ttl)?;
    info!(user_id = %user.id, email = %user.email, "user registered");

    Ok(AuthSession { user, token })
}

/// Authenticate with email + password.
///
/// "No such user" and "wrong password" produce the same error after the
/// same amount of bcrypt work.
pub async fn login(
    auth: &AuthService,
    email: &str,
    password: &str,
) -> Result<AuthSession, AuthError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::ValidationError(
            "Email and password are required".into(),
        ));
    }

    let record = auth.store.find_user_by_email(email).await?;

    let hasher = auth.hasher.clone();
    let plaintext = password.to_string();
    let user = run_blocking(move || check_credentials(&hasher, &plaintext, record))
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let token = auth.codec.issue(&TokenClaims::for_user(&user), auth.policy.ttl)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");

    Ok(AuthSession { user, token })
}

/// One bcrypt comparison whether or not the user exists.
fn check_credentials(
    hasher: &PasswordHasher,
    password: &str,
    record: Option<UserRecord>,
) -> Option<User> {
    match record {
        Some(record) => hasher
            .verify(password, &record.password_hash)
            .then_some(record.user),
        None => {
            hasher.verify_absent(password);
            None
        }
    }
}

/// Run CPU-heavy hashing off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Internal(format!("hashing task: {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::jwt::{DecodeOptions, TokenCodec};
    use crate::auth::store::{MemoryUserStore, StoreError, UserStore};
    use crate::auth::TokenPolicy;
    use async_trait::async_trait;

    fn service(store: Arc<dyn UserStore>) -> AuthService {
        AuthService::new(
            store,
            PasswordHasher::with_cost(4).unwrap(),
            TokenCodec::from_secret(b"issuance-test-secret-0123456789abcdef"),
            TokenPolicy::default(),
        )
    }

    /// Store that is always down.
    struct DownStore;

    #[async_trait]
    impl UserStore for DownStore {
        async fn find_user_by_email(&self, _: &str) -> Result<Option<UserRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn insert_user(&self, _: &str, _: &str, _: &str) -> Result<User, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn email_shapes() {
        assert!(valid_email("a@x.com"));
        assert!(!valid_email("a@x"));
        assert!(!valid_email("ax.com"));
        assert!(!valid_email("a b@x.com"));
        assert!(!valid_email(""));
    }

    #[test]
    fn registration_validation_rules() {
        assert!(validate_registration("a@x.com", "secret1", "A").is_ok());
        assert!(validate_registration("bad", "secret1", "A").is_err());
        assert!(validate_registration("a@x.com", "12345", "A").is_err());
        assert!(validate_registration("a@x.com", "123456", "A").is_ok());
        assert!(validate_registration("a@x.com", "secret1", "   ").is_err());
    }

    #[tokio::test]
    async fn register_issues_token_for_new_user() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = service(store.clone());
        let session = auth.register("a@x.com", "secret1", "A").await.unwrap();

        assert_eq!(session.user.email, "a@x.com");
        assert_eq!(session.user.name, "A");
        let decoded = auth
            .codec()
            .decode(&session.token.token, DecodeOptions::STRICT)
            .unwrap();
        let claims = decoded.claims().unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.user_id, session.user.id);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = service(store.clone());
        auth.register("a@x.com", "secret1", "A").await.unwrap();
        let record = store.find_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(record.password_hash, "secret1");
        assert!(record.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn duplicate_registration_is_already_exists() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = service(store.clone());
        auth.register("a@x.com", "secret1", "A").await.unwrap();
        let err = auth.register("a@x.com", "secret2", "B").await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn invalid_registration_touches_nothing() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = service(store.clone());
        let err = auth.register("a@x.com", "short", "A").await.unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn login_with_correct_password() {
        let auth = service(Arc::new(MemoryUserStore::new()));
        let registered = auth.register("a@x.com", "secret1", "A").await.unwrap();
        let session = auth.login("a@x.com", "secret1").await.unwrap();
        assert_eq!(session.user, registered.user);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let auth = service(Arc::new(MemoryUserStore::new()));
        auth.register("a@x.com", "secret1", "A").await.unwrap();

        let wrong = auth.login("a@x.com", "nope-nope").await.unwrap_err();
        let absent = auth.login("b@x.com", "secret1").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(absent, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), absent.to_string());
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let auth = service(Arc::new(MemoryUserStore::new()));
        assert!(matches!(
            auth.login("", "secret1").await,
            Err(AuthError::ValidationError(_))
        ));
        assert!(matches!(
            auth.login("a@x.com", "").await,
            Err(AuthError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn store_outage_is_store_unavailable() {
        let auth = service(Arc::new(DownStore));
        assert!(matches!(
            auth.register("a@x.com", "secret1", "A").await,
            Err(AuthError::StoreUnavailable(_))
        ));
        assert!(matches!(
            auth.login("a@x.com", "secret1").await,
            Err(AuthError::StoreUnavailable(_))
        ));
    }
}
