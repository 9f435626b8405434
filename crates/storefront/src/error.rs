//! Unified error handling with Sentry integration.
//!
//! Provides the crate-level `ClientError` returned by session operations,
//! plus helpers that attach user context and breadcrumbs to Sentry reports.
//! The helpers are no-ops when Sentry has not been initialized.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Error type for storefront client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Login email failed validation.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] cardshop_core::EmailError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Message suitable for display next to the affected control.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            Self::InvalidEmail(_) => "Please enter a valid email address".to_string(),
            Self::Config(_) => "Client is misconfigured".to_string(),
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("sync", "Cart merge failed", Some(&[("items", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::from(ConfigError::MissingEnvVar("CARDSHOP_API_URL".to_string()));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing environment variable: CARDSHOP_API_URL"
        );

        let err = ClientError::from(ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(err.to_string(), "API error: API error: 500 - boom");
    }

    #[test]
    fn test_user_messages() {
        let err = ClientError::from(cardshop_core::EmailError::Empty);
        assert_eq!(err.user_message(), "Please enter a valid email address");

        let err = ClientError::from(ApiError::Status {
            status: 400,
            message: "Product unavailable".to_string(),
        });
        assert_eq!(err.user_message(), "Product unavailable");
    }

    #[test]
    fn test_sentry_helpers_without_client() {
        set_sentry_user(&42, Some("shopper@example.com"));
        add_breadcrumb("sync", "Cart merge failed", Some(&[("items", "2")]));
        clear_sentry_user();
    }
}
