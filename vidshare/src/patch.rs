//! Field-level patches and the equality guards that scope them.

use serde::Serialize;
use serde_json::Value;

use crate::{errors::RepoError, id::Principal};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOp {
    Assign { field: String, value: Value },
    /// Append to an array field unless an equal element is already present.
    AddToSet { field: String, value: Value },
    /// Remove every element equal to `value` from an array field.
    Pull { field: String, value: Value },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

/// `null`, `""`, `0` and `false` count as "not supplied" for partial updates.
pub fn is_supplied(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::Assign {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Assign only if the value is supplied in the partial-update sense.
    pub fn assign_supplied(self, field: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value.map(Into::into) {
            Some(value) if is_supplied(&value) => self.assign(field, value),
            _ => self,
        }
    }

    pub fn add_to_set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::AddToSet {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn pull(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::Pull {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every op to `document` in order.
    pub fn apply(&self, document: &mut Value) -> Result<(), RepoError> {
        let Value::Object(map) = document else {
            return Err(RepoError::other("patch target is not an object"));
        };
        for op in &self.ops {
            match op {
                PatchOp::Assign { field, value } => {
                    map.insert(field.clone(), value.clone());
                }
                PatchOp::AddToSet { field, value } => {
                    let slot = map.entry(field.clone()).or_insert_with(|| Value::Array(Vec::new()));
                    let Value::Array(items) = slot else {
                        return Err(RepoError::other(format!("field `{field}` is not an array")));
                    };
                    if !items.contains(value) {
                        items.push(value.clone());
                    }
                }
                PatchOp::Pull { field, value } => match map.get_mut(field.as_str()) {
                    Some(Value::Array(items)) => items.retain(|item| item != value),
                    None | Some(Value::Null) => {}
                    Some(_) => return Err(RepoError::other(format!("field `{field}` is not an array"))),
                },
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardCondition {
    pub field: String,
    pub value: Value,
}

/// Equality conditions that must all hold on the stored record for a
/// conditional update or delete to apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Guard {
    conditions: Vec<GuardCondition>,
}

impl Guard {
    pub fn none() -> Self {
        Self::default()
    }

    /// `owner == principal`
    pub fn owned_by(principal: &Principal) -> Self {
        Self::none().field_eq("owner", principal.as_str())
    }

    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(GuardCondition {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[GuardCondition] {
        &self.conditions
    }

    pub fn holds(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|c| document.get(c.field.as_str()).is_some_and(|actual| *actual == c.value))
    }
}
