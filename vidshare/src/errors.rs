use std::borrow::Cow;

use thiserror::Error;

use crate::types::EntityKind;

/// Top-level error type returned by the vidshare core.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Caller supplied something unusable: a malformed id, a missing field,
    /// blank content, an unknown sort field or a self-subscription.
    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument { field: Cow<'static, str>, message: String },

    /// Owner-scoped mutation matched nothing. Does not say whether the record
    /// is missing or belongs to someone else.
    #[error("{entity} not found or not owned by principal")]
    NotFoundOrNotOwned { entity: EntityKind },

    /// Plain keyed read found nothing.
    #[error("{entity} `{entity_id}` not found")]
    NotFound { entity: EntityKind, entity_id: String },

    /// Media upload did not produce a usable reference.
    #[error("upstream failure: {message}")]
    UpstreamFailure { message: String },

    /// A uniqueness constraint is already held by another record.
    #[error("unique constraint `{constraint}` violated (held by '{existing_entity_id}')")]
    UniqueConstraintViolation {
        constraint: String,
        existing_entity_id: String,
    },

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl RepoError {
    /// Convenience constructor for [`RepoError::InvalidArgument`].
    pub fn invalid(field: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// HTTP-style status the presentation layer should report for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument { .. } => 400,
            Self::NotFoundOrNotOwned { .. } | Self::NotFound { .. } => 404,
            Self::UniqueConstraintViolation { .. } => 409,
            Self::UpstreamFailure { .. } => 502,
            Self::Redis(_) | Self::Other { .. } => 500,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    pub fn is_not_found_or_not_owned(&self) -> bool {
        matches!(self, Self::NotFoundOrNotOwned { .. })
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other {
            message: Cow::Owned(format!("json error: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_distinct_per_kind() {
        assert_eq!(RepoError::invalid("videoId", "malformed").status_code(), 400);
        assert_eq!(
            RepoError::NotFoundOrNotOwned {
                entity: EntityKind::Comment
            }
            .status_code(),
            404
        );
        assert_eq!(
            RepoError::UpstreamFailure {
                message: "no url".to_string()
            }
            .status_code(),
            502
        );
        assert_eq!(
            RepoError::UniqueConstraintViolation {
                constraint: "username".to_string(),
                existing_entity_id: "x".to_string()
            }
            .status_code(),
            409
        );
    }

    #[test]
    fn not_owned_message_does_not_leak_existence() {
        let err = RepoError::NotFoundOrNotOwned {
            entity: EntityKind::Video,
        };
        assert_eq!(err.to_string(), "video not found or not owned by principal");
    }
}
