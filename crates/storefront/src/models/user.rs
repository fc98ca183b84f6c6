//! User and profile rows.

use chrono::{DateTime, Utc};

use greenshop_core::{ProfileId, UserId};

use super::session::CurrentUser;

/// A registered user.
///
/// The password hash is deliberately absent; it is only read by
/// [`UserRepository::get_password_hash`](crate::db::users::UserRepository::get_password_hash).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Identity stored in the session after login.
    #[must_use]
    pub fn to_current(&self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            username: self.username.clone(),
            is_staff: self.is_staff,
        }
    }
}

/// Contact details kept alongside a user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserProfile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
