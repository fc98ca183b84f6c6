//! User repository for database operations.
//!
//! Users and their one-to-one profiles. A profile is created in the same
//! transaction as its user; later reads go through
//! [`UserRepository::get_or_create_profile`] so older rows without one still
//! work.

use sqlx::{PgPool, Postgres, QueryBuilder};

use greenshop_core::UserId;

use super::{RepositoryError, like_pattern};
use crate::models::user::{User, UserProfile};

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, is_staff, is_active, created_at, updated_at";

const PROFILE_COLUMNS: &str =
    "id, user_id, phone, address, city, postal_code, created_at, updated_at";

/// A user about to be created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
}

/// Editable profile fields.
#[derive(Debug, Clone, Default)]
pub struct ProfileInput {
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

/// Profile joined with its user, for the admin list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileListRow {
    #[sqlx(flatten)]
    pub profile: UserProfile,
    pub username: String,
    pub email: String,
}

#[derive(sqlx::FromRow)]
struct UserWithHash {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Whether a username is already registered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// Get a user together with their password hash, by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHash>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// Create a user and their empty profile in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_profile(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, first_name, last_name, password_hash, is_staff) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.password_hash)
        .bind(new_user.is_staff)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "username"))?;

        sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Fetch a user's profile, creating an empty one if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create_profile(&self, user_id: UserId) -> Result<UserProfile, RepositoryError> {
        sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(profile)
    }

    /// Replace a user's profile fields, creating the profile if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        input: &ProfileInput,
    ) -> Result<UserProfile, RepositoryError> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "INSERT INTO user_profiles (user_id, phone, address, city, postal_code) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id) DO UPDATE SET phone = EXCLUDED.phone, \
             address = EXCLUDED.address, city = EXCLUDED.city, \
             postal_code = EXCLUDED.postal_code, updated_at = NOW() \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.postal_code)
        .fetch_one(self.pool)
        .await?;
        Ok(profile)
    }

    /// Profiles for the admin list, searchable by username, phone or city.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_profiles(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<ProfileListRow>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT p.id, p.user_id, p.phone, p.address, p.city, p.postal_code, \
             p.created_at, p.updated_at, u.username, u.email \
             FROM user_profiles p JOIN users u ON u.id = p.user_id",
        );
        if let Some(query) = query {
            let pattern = like_pattern(query);
            qb.push(" WHERE u.username ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.phone ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.city ILIKE ")
                .push_bind(pattern);
        }
        qb.push(" ORDER BY u.username");
        Ok(qb
            .build_query_as::<ProfileListRow>()
            .fetch_all(self.pool)
            .await?)
    }

    /// Number of users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?)
    }
}
