use super::ConfigError;

/// The scope a personalization record belongs to: one grid widget instance,
/// optionally narrowed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridIdentity {
    /// Caller-supplied id, unique per grid instance.
    pub widget_id: String,
    /// Whether settings are stored per user.
    pub user_specific: bool,
    /// Resolved user id; required iff `user_specific`.
    pub user_id: Option<String>,
}

impl GridIdentity {
    /// Identity shared by every user of the widget.
    pub fn shared(widget_id: impl Into<String>) -> Self {
        GridIdentity {
            widget_id: widget_id.into(),
            user_specific: false,
            user_id: None,
        }
    }

    /// Identity scoped to a single user.
    pub fn for_user(widget_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        GridIdentity {
            widget_id: widget_id.into(),
            user_specific: true,
            user_id: Some(user_id.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.widget_id.is_empty() {
            return Err(ConfigError::MissingWidgetId);
        }
        if self.user_specific && self.user_id.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingUserId);
        }
        Ok(())
    }
}
