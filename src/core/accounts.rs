//! Account business logic - registration, credential checks and cookie sessions.
//!
//! Passwords are hashed with Argon2 using a fresh random salt per account.
//! Sessions are server-side rows keyed by an opaque random token; the token is
//! the only thing handed to the client.

use crate::{
    core::validation::{FieldErrors, REQUIRED},
    entities::{Session, User, session, user},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use sea_orm::{Set, SqlErr, prelude::*};
use tracing::{debug, info, instrument, warn};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;
/// Maximum username length, in characters.
pub const MAX_USERNAME_LEN: usize = 150;

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

/// Registration input as submitted by the client.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    /// Login email
    pub email: String,
    /// Public display name
    pub username: String,
    /// Plaintext password, hashed before storage
    pub password: String,
    /// Optional repeat of the password; must match when present
    pub password_confirm: Option<String>,
}

/// Hashes a plain-text password using Argon2.
///
/// # Errors
/// Returns [`Error::PasswordHash`] if hashing fails.
#[instrument(name = "accounts::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Verifies a plain-text password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on mismatch; an unparseable stored hash is an error.
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| Error::PasswordHash {
        message: format!("Invalid stored password hash: {e}"),
    })?;
    Ok(Argon2::default()
        .verify_password(provided_password.as_bytes(), &parsed)
        .is_ok())
}

/// Lowercases the domain part of an email and trims surrounding whitespace.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Loose structural email check: one `@`, non-empty local part, dotted domain.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Finds a user by their (normalized) email.
pub async fn get_user_by_email<C>(db: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an active user by id. Inactive or missing users yield `None`.
pub async fn get_active_user<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    Ok(User::find_by_id(user_id)
        .one(db)
        .await?
        .filter(|user| user.is_active))
}

/// Registers a new account after validating every field.
///
/// # Errors
/// Returns [`Error::Validation`] if:
/// - The email is missing, malformed or already registered
/// - The username is blank, too long or already taken
/// - The password is shorter than [`MIN_PASSWORD_LEN`] or does not match its confirmation
#[instrument(skip(db, account), fields(email = %account.email, username = %account.username))]
pub async fn register(db: &DatabaseConnection, account: NewAccount) -> Result<user::Model> {
    let mut errors = FieldErrors::default();
    let email = normalize_email(&account.email);
    let username = account.username.trim().to_string();

    if email.is_empty() {
        errors.add("email", REQUIRED);
    } else if !is_valid_email(&email) {
        errors.add("email", "Enter a valid email address.");
    } else if get_user_by_email(db, &email).await?.is_some() {
        errors.add("email", "A user with this email address already exists.");
    }

    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username.chars().count() > MAX_USERNAME_LEN {
        errors.add(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_LEN} characters."),
        );
    } else if User::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        errors.add("username", "A user with that username already exists.");
    }

    if account.password.is_empty() {
        errors.add("password", REQUIRED);
    } else if account.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."),
        );
    }
    if let Some(confirm) = &account.password_confirm {
        if *confirm != account.password {
            errors.add("password_confirm", "The two password fields didn't match.");
        }
    }

    errors.into_result()?;

    let new_user = user::ActiveModel {
        email: Set(email),
        username: Set(username),
        password: Set(hash_password(&account.password)?),
        start_date: Set(Utc::now()),
        about: Set(String::new()),
        is_staff: Set(false),
        is_active: Set(true),
        ..Default::default()
    };

    match new_user.insert(db).await {
        Ok(created) => {
            info!(user_id = created.id, "Registered new account");
            Ok(created)
        }
        // Lost a race with a concurrent registration for the same email/username
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            warn!("Registration hit a unique constraint: {}", err);
            Err(Error::validation(
                "non_field_errors",
                "An account with this email or username already exists.",
            ))
        }
        Err(err) => Err(err.into()),
    }
}

/// Checks an email/password pair and returns the matching active user.
///
/// # Errors
/// Returns [`Error::Authentication`] for an unknown email, a wrong password, or an inactive account.
#[instrument(skip(db, password))]
pub async fn authenticate<C>(db: &C, email: &str, password: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let invalid = || Error::Authentication {
        message: INVALID_CREDENTIALS.to_string(),
    };

    let Some(found) = get_user_by_email(db, email).await? else {
        debug!("No account for email");
        return Err(invalid());
    };
    if !found.is_active || !verify_password(&found.password, password)? {
        debug!(user_id = found.id, "Credential check failed");
        return Err(invalid());
    }
    Ok(found)
}

/// Authenticates and opens a new cookie session lasting `ttl`.
pub async fn login(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    ttl: Duration,
) -> Result<(session::Model, user::Model)> {
    let found = authenticate(db, email, password).await?;
    let now = Utc::now();
    let created = session::ActiveModel {
        token: Set(Uuid::new_v4().simple().to_string()),
        user_id: Set(found.id),
        created_at: Set(now),
        expires_at: Set(now + ttl),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = found.id, session_id = created.id, "Session opened");
    Ok((created, found))
}

/// Deletes the session identified by `token`. Returns whether a row was removed.
pub async fn logout(db: &DatabaseConnection, token: &str) -> Result<bool> {
    let result = Session::delete_many()
        .filter(session::Column::Token.eq(token))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Resolves a session token to its active user. Unknown or expired sessions yield `None`.
pub async fn resolve_session(db: &DatabaseConnection, token: &str) -> Result<Option<user::Model>> {
    let found = Session::find()
        .filter(session::Column::Token.eq(token))
        .find_also_related(User)
        .one(db)
        .await?;

    match found {
        Some((session, Some(owner))) if session.expires_at > Utc::now() && owner.is_active => {
            Ok(Some(owner))
        }
        Some((session, _)) if session.expires_at <= Utc::now() => {
            debug!(session_id = session.id, "Session expired");
            Session::delete_by_id(session.id).exec(db).await?;
            Ok(None)
        }
        _ => Ok(None),
    }
}
