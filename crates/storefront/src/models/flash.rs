//! One-shot flash messages stored in the session.
//!
//! Handlers push a message before redirecting; the next rendered page drains
//! the queue through [`PageContext`](crate::middleware::PageContext).

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::keys;

/// Severity of a flash message; doubles as the CSS modifier class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A queued message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    /// Append a message to the session queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn push(
        session: &Session,
        level: FlashLevel,
        message: impl Into<String>,
    ) -> Result<(), tower_sessions::session::Error> {
        let mut queue: Vec<Self> = session.get(keys::FLASH).await?.unwrap_or_default();
        queue.push(Self {
            level,
            message: message.into(),
        });
        session.insert(keys::FLASH, queue).await
    }

    /// Take every queued message, leaving the queue empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn drain(session: &Session) -> Result<Vec<Self>, tower_sessions::session::Error> {
        Ok(session
            .remove::<Vec<Self>>(keys::FLASH)
            .await?
            .unwrap_or_default())
    }
}
