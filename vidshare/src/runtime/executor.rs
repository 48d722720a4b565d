use std::borrow::Cow;

use redis::{Script, aio::ConnectionLike};
use serde_json::Value;

use crate::errors::RepoError;

/// Run `script` and decode its JSON reply, turning script-level error codes
/// into [`RepoError`]s.
pub async fn invoke_script<C>(conn: &mut C, script: &Script, keys: &[String], args: &[String]) -> Result<Value, RepoError>
where
    C: ConnectionLike + Send,
{
    let mut invocation = script.prepare_invoke();
    for key in keys {
        invocation.key(key);
    }
    for arg in args {
        invocation.arg(arg);
    }
    let raw: String = invocation.invoke_async(conn).await.map_err(RepoError::from)?;

    let value: Value = serde_json::from_str(&raw).map_err(|err| RepoError::Other {
        message: Cow::Owned(format!("failed to parse lua response: {err}")),
    })?;

    match script_error(&value) {
        Some(err) => Err(err),
        None => Ok(value),
    }
}

fn script_error(value: &Value) -> Option<RepoError> {
    let error = value.get("error")?;
    let Some(code) = error.as_str() else {
        return Some(RepoError::other("lua_error"));
    };
    let text = |field: &str| {
        value
            .get(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_default()
    };
    Some(match code {
        "entity_exists" => RepoError::UniqueConstraintViolation {
            constraint: "id".to_string(),
            existing_entity_id: text("entity_id"),
        },
        "unique_constraint_violation" => RepoError::UniqueConstraintViolation {
            constraint: text("constraint"),
            existing_entity_id: text("existing_entity_id"),
        },
        other => RepoError::Other {
            message: Cow::Owned(other.to_string()),
        },
    })
}
