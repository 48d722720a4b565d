//! # RediSearch plumbing
//!
//! Index creation, `FT.SEARCH` execution and the escaping rules used when
//! rendering [`crate::filters::Filter`]s as query strings.
//!
//! | Function                          | Input         | Output         | Use Case                  |
//! |-----------------------------------|---------------|----------------|---------------------------|
//! | `escape_for_tag_query(value)`     | `"test-user"` | `"test\-user"` | TAG field: `@field:{...}` |
//! | `escape_for_text_contains(value)` | `"hello"`     | `"*hello*"`    | TEXT substring match      |
//!
//! TAG fields match exactly and must escape `$ { } \ | - .`. TEXT fields are
//! tokenized at index time, so a contains query matches within tokens only.

use std::borrow::Cow;

use redis::{Value, aio::ConnectionLike, cmd, from_redis_value};
use serde_json::Value as JsonValue;

use crate::{
    errors::RepoError,
    types::{IndexField, IndexFieldType, SortSpec},
};

pub(crate) const TAG_SEPARATOR: &str = "|";

#[derive(Debug, Clone)]
pub struct IndexDefinition {
    pub name: String,
    pub prefix: String,
    pub schema: &'static [IndexField],
}

/// Create the index unless one with the same name already exists.
pub async fn ensure_index<C>(conn: &mut C, definition: &IndexDefinition) -> Result<(), RepoError>
where
    C: ConnectionLike + Send,
{
    let indexes: Vec<String> = cmd("FT._LIST").query_async(conn).await?;
    if indexes.iter().any(|name| name == &definition.name) {
        return Ok(());
    }

    let mut command = cmd("FT.CREATE");
    command.arg(definition.name.as_str());
    command.arg("ON").arg("JSON");
    command.arg("PREFIX").arg(1).arg(definition.prefix.as_str());

    command.arg("SCHEMA");
    for field in definition.schema {
        command.arg(field.path());
        command.arg("AS").arg(field.field);
        match field.field_type {
            IndexFieldType::Tag => {
                command.arg("TAG");
                command.arg("SEPARATOR").arg(TAG_SEPARATOR);
            }
            IndexFieldType::Text => {
                command.arg("TEXT");
            }
            IndexFieldType::Numeric => {
                command.arg("NUMERIC");
            }
        }

        if field.sortable {
            command.arg("SORTABLE");
        }
    }

    if let Err(err) = command.query_async::<()>(conn).await {
        if index_exists_error(&err) {
            return Ok(());
        }
        return Err(err.into());
    }

    log::debug!("created search index {}", definition.name);
    Ok(())
}

fn index_exists_error(err: &redis::RedisError) -> bool {
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("already exists") && msg.contains("index")
}

#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub index: &'a str,
    pub query: String,
    pub sort: Option<SortSpec>,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SearchHits {
    pub total: u64,
    pub documents: Vec<JsonValue>,
}

pub async fn execute_search<C>(conn: &mut C, request: &SearchRequest<'_>) -> Result<SearchHits, RepoError>
where
    C: ConnectionLike + Send,
{
    let mut command = cmd("FT.SEARCH");
    command.arg(request.index);
    command.arg(request.query.as_str());

    if let Some(sort) = &request.sort {
        command.arg("SORTBY").arg(sort.field).arg(sort.order.as_str());
    }

    command.arg("LIMIT").arg(request.offset).arg(request.limit);
    if request.limit > 0 {
        command.arg("RETURN").arg(1).arg("$");
    } else {
        command.arg("NOCONTENT");
    }
    command.arg("DIALECT").arg(3);

    let raw: Value = command.query_async(conn).await?;
    parse_search_response(&raw, request.limit > 0)
}

/// Number of documents matching `query`.
pub async fn execute_count<C>(conn: &mut C, index: &str, query: String) -> Result<u64, RepoError>
where
    C: ConnectionLike + Send,
{
    let request = SearchRequest {
        index,
        query,
        sort: None,
        offset: 0,
        limit: 0,
    };
    Ok(execute_search(conn, &request).await?.total)
}

fn parse_search_response(raw: &Value, with_content: bool) -> Result<SearchHits, RepoError> {
    let values: Vec<Value> = from_redis_value(raw).map_err(|err| RepoError::Other {
        message: Cow::Owned(format!("Failed to parse search response: {}", err)),
    })?;

    let Some(first) = values.first() else {
        return Ok(SearchHits::default());
    };

    let total = match first {
        Value::Int(v) => *v as u64,
        Value::BulkString(bytes) => String::from_utf8(bytes.clone())
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| RepoError::other("Invalid total count in search response"))?,
        other => {
            return Err(RepoError::other(format!("Unexpected total count type: {:?}", other)));
        }
    };

    let mut documents = Vec::new();
    if with_content {
        let mut idx = 1;
        while idx + 1 < values.len() {
            let payload = extract_json_payload(&values[idx + 1])?;
            let document: JsonValue = serde_json::from_str(&payload).map_err(|err| RepoError::Other {
                message: Cow::Owned(format!("Failed to deserialize search document: {}", err)),
            })?;
            documents.push(document);
            idx += 2;
        }
    }

    Ok(SearchHits { total, documents })
}

fn extract_json_payload(value: &Value) -> Result<String, RepoError> {
    match value {
        Value::Array(items) => {
            for chunk in items.chunks(2) {
                if chunk.len() != 2 {
                    continue;
                }

                let alias: String = from_redis_value(&chunk[0]).map_err(|err| RepoError::Other {
                    message: Cow::Owned(format!("Invalid field alias in search document: {}", err)),
                })?;

                if alias == "$" {
                    let payload = value_to_string(&chunk[1])?;
                    return normalize_json_payload(payload);
                }
            }

            Err(RepoError::other("Search response missing JSON payload"))
        }
        other => normalize_json_payload(value_to_string(other)?),
    }
}

/// `RETURN 1 $` under DIALECT 3 wraps the document in a one-element array.
pub(crate) fn normalize_json_payload(mut payload: String) -> Result<String, RepoError> {
    let trimmed = payload.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let value: JsonValue = serde_json::from_str(trimmed).map_err(|err| RepoError::Other {
            message: Cow::Owned(format!("Failed to parse JSON payload array: {}", err)),
        })?;
        if let Some(first) = value.as_array().and_then(|arr| arr.first()) {
            payload = serde_json::to_string(first)?;
        }
    }
    Ok(payload)
}

fn value_to_string(value: &Value) -> Result<String, RepoError> {
    match value {
        Value::BulkString(bytes) => String::from_utf8(bytes.clone()).map_err(|err| RepoError::Other {
            message: Cow::Owned(format!("Invalid UTF-8 in search response: {}", err)),
        }),
        Value::SimpleString(status) => Ok(status.clone()),
        Value::Int(v) => Ok(v.to_string()),
        Value::Double(v) => Ok(v.to_string()),
        Value::Boolean(v) => Ok(v.to_string()),
        Value::VerbatimString { text, .. } => Ok(text.clone()),
        _ => from_redis_value::<String>(value).map_err(|err| RepoError::Other {
            message: Cow::Owned(format!("Unexpected search value type: {}", err)),
        }),
    }
}

/// Escape a value for RediSearch TAG field queries.
///
/// ```
/// use vidshare::search::escape_for_tag_query;
///
/// assert_eq!(escape_for_tag_query("active"), "active");
/// assert_eq!(escape_for_tag_query("test-user"), "test\\-user");
/// assert_eq!(escape_for_tag_query("a|b"), "a\\|b");
/// assert_eq!(escape_for_tag_query("{foo}"), "\\{foo\\}");
/// ```
pub fn escape_for_tag_query(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            // '-' is the NOT operator, '.' the JSON path separator
            '$' | '{' | '}' | '\\' | '|' | '.' | '-' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escape and wrap a value in `*...*` for substring matching on TEXT fields.
///
/// ```
/// use vidshare::search::escape_for_text_contains;
///
/// assert_eq!(escape_for_text_contains("hello"), "*hello*");
/// assert_eq!(escape_for_text_contains("50%"), "*50\\%*");
/// ```
pub fn escape_for_text_contains(value: &str) -> String {
    format!("*{}*", escape_text_value(value))
}

fn escape_text_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' | '(' | ')' | '|' | '\'' | '"' | '[' | ']' | '{' | '}' | ':' | '@' | '?' | '~' | '&' | '!' | '.'
            | '*' | '%' | ' ' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
