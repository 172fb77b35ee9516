//! Collection schemas and field validation

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use email_address::EmailAddress;
use serde_json::{Number, Value};

use super::actor::Actor;
use super::record::{Fields, Record, RESERVED_FIELDS};
use crate::error::DomainError;

/// Value kind and range of a declared field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Length bounds count characters, not bytes. `min_words` counts
    /// whitespace-separated words, `0` means no rule.
    Text { min_len: usize, max_len: usize, min_words: usize },
    Integer { min: Option<i64>, max: Option<i64> },
    Number { min: Option<f64>, min_exclusive: bool, max: Option<f64> },
    Bool,
    Email,
    Choice(&'static [&'static str]),
    /// RFC 3339 string.
    Timestamp,
    /// JSON object with exactly these keys, all required.
    Object(&'static [(&'static str, FieldKind)]),
    List { item: &'static FieldKind, min_items: usize },
}

impl FieldKind {
    pub fn text(min_len: usize, max_len: usize) -> Self {
        FieldKind::Text { min_len, max_len, min_words: 0 }
    }

    /// First name and surname.
    pub fn full_name(min_len: usize, max_len: usize) -> Self {
        FieldKind::Text { min_len, max_len, min_words: 2 }
    }

    pub fn integer(min: Option<i64>, max: Option<i64>) -> Self {
        FieldKind::Integer { min, max }
    }

    /// Strictly greater than `min`.
    pub fn positive_number() -> Self {
        FieldKind::Number { min: Some(0.0), min_exclusive: true, max: None }
    }

    /// Checks a non-null value; the message is phrased to follow the field name.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            FieldKind::Text { min_len, max_len, min_words } => {
                let s = value.as_str().ok_or("must be a string")?;
                let len = s.chars().count();
                if len < *min_len {
                    return Err(format!("must have at least {} characters", min_len));
                }
                if len > *max_len {
                    return Err(format!("must have at most {} characters", max_len));
                }
                if s.split_whitespace().count() < *min_words {
                    return Err(format!("must contain at least {} words", min_words));
                }
                Ok(())
            }
            FieldKind::Integer { min, max } => {
                let n = value.as_i64().ok_or("must be an integer")?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(format!("must be greater than or equal to {}", min));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(format!("must be less than or equal to {}", max));
                    }
                }
                Ok(())
            }
            FieldKind::Number { min, min_exclusive, max } => {
                let n = value.as_f64().ok_or("must be a number")?;
                if let Some(min) = min {
                    if *min_exclusive && n <= *min {
                        return Err(format!("must be greater than {}", min));
                    }
                    if !*min_exclusive && n < *min {
                        return Err(format!("must be greater than or equal to {}", min));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(format!("must be less than or equal to {}", max));
                    }
                }
                Ok(())
            }
            FieldKind::Bool => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err("must be a boolean".to_string())
                }
            }
            FieldKind::Email => {
                let s = value.as_str().ok_or("must be a string")?;
                if EmailAddress::is_valid(s) {
                    Ok(())
                } else {
                    Err("must be a valid e-mail address".to_string())
                }
            }
            FieldKind::Choice(options) => {
                let s = value.as_str().ok_or("must be a string")?;
                if options.contains(&s) {
                    Ok(())
                } else {
                    Err(format!("must be one of: {}", options.join(", ")))
                }
            }
            FieldKind::Timestamp => {
                let s = value.as_str().ok_or("must be a string")?;
                parse_timestamp(s)
                    .map(|_| ())
                    .ok_or_else(|| "must be an RFC 3339 timestamp".to_string())
            }
            FieldKind::Object(keys) => {
                let object = value.as_object().ok_or("must be an object")?;
                let unknown = object
                    .keys()
                    .find(|key| !keys.iter().any(|(name, _)| *name == key.as_str()));
                if let Some(unknown) = unknown {
                    return Err(format!("has unknown key '{}'", unknown));
                }
                for (name, kind) in keys.iter() {
                    match object.get(*name) {
                        None | Some(Value::Null) => return Err(format!("is missing '{}'", name)),
                        Some(v) => kind.check(v).map_err(|msg| format!("'{}' {}", name, msg))?,
                    }
                }
                Ok(())
            }
            FieldKind::List { item, min_items } => {
                let items = value.as_array().ok_or("must be a list")?;
                if items.len() < *min_items {
                    return Err(format!("must contain at least {} items", min_items));
                }
                for (index, v) in items.iter().enumerate() {
                    item.check(v).map_err(|msg| format!("item {}: {}", index, msg))?;
                }
                Ok(())
            }
        }
    }

    /// Equality for unique fields. E-mail addresses ignore case.
    pub fn same_value(&self, a: &Value, b: &Value) -> bool {
        match (self, a.as_str(), b.as_str()) {
            (FieldKind::Email, Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => a == b,
        }
    }

    /// Interprets a raw query-string value as a value of this kind.
    /// `None` means the filter can never match.
    pub fn parse_query(&self, raw: &str) -> Option<Value> {
        match self {
            FieldKind::Text { .. } | FieldKind::Email | FieldKind::Choice(_) => {
                Some(Value::String(raw.to_string()))
            }
            FieldKind::Integer { .. } => raw.trim().parse::<i64>().ok().map(Value::from),
            FieldKind::Number { .. } => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            FieldKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            FieldKind::Timestamp => {
                parse_timestamp(raw.trim()).map(|_| Value::String(raw.trim().to_string()))
            }
            FieldKind::Object(_) | FieldKind::List { .. } => None,
        }
    }

    /// Orders two values of this kind; `None` if either does not fit the kind.
    pub fn compare(&self, a: &Value, b: &Value) -> Option<Ordering> {
        match self {
            FieldKind::Integer { .. } | FieldKind::Number { .. } => {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            FieldKind::Bool => Some(a.as_bool()?.cmp(&b.as_bool()?)),
            FieldKind::Timestamp => {
                Some(parse_timestamp(a.as_str()?)?.cmp(&parse_timestamp(b.as_str()?)?))
            }
            FieldKind::Text { .. } | FieldKind::Email | FieldKind::Choice(_) => {
                Some(a.as_str()?.cmp(b.as_str()?))
            }
            FieldKind::Object(_) | FieldKind::List { .. } => None,
        }
    }

    /// Kinds that accept `_min` / `_max` range filters.
    pub fn is_ranged(&self) -> bool {
        matches!(
            self,
            FieldKind::Integer { .. } | FieldKind::Number { .. } | FieldKind::Timestamp
        )
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Read-only fields are set by services, never by request bodies.
    pub writable: bool,
    /// Writable on create but not in a patch.
    pub updatable: bool,
    pub unique: bool,
    /// Effective value when the record does not carry the field.
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            writable: true,
            updatable: true,
            unique: false,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { required: false, ..Self::required(name, kind) }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn create_only(mut self) -> Self {
        self.updatable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Who may mutate a record once a session is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Any authenticated caller.
    Unowned,
    /// Only the user that created the record.
    Creator,
    /// The record is a user; only that user.
    SelfRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    pub create_requires_session: bool,
    pub ownership: Ownership,
}

/// Whether read-only fields may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    Client,
    Service,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
    pub access: AccessPolicy,
}

impl CollectionSchema {
    pub fn new(name: &'static str, access: AccessPolicy) -> Self {
        Self { name, fields: Vec::new(), access }
    }

    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Kind of a filterable name; `created_at` is a timestamp on every collection.
    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        if name == "created_at" {
            return Some(FieldKind::Timestamp);
        }
        self.spec(name).map(|s| s.kind.clone())
    }

    /// Stored value, else the declared default.
    pub fn effective<'a>(&self, record: &'a Record, name: &str) -> Option<Cow<'a, Value>> {
        if name == "created_at" {
            return Some(Cow::Owned(Value::String(record.created_at.to_rfc3339())));
        }
        match record.fields.get(name) {
            Some(value) => Some(Cow::Borrowed(value)),
            None => self.spec(name)?.default.clone().map(Cow::Owned),
        }
    }

    /// Validates a create body. Nulls are dropped, so an explicit `null` on
    /// an optional field is the same as leaving it out.
    pub fn validate_new(&self, input: Value, access: FieldAccess) -> Result<Fields, DomainError> {
        let input = into_object(input)?;
        let mut fields = Fields::new();
        for (name, value) in input {
            self.check_entry(&name, &value, access)?;
            if !value.is_null() {
                fields.insert(name, value);
            }
        }

        if let Some(missing) = self
            .fields
            .iter()
            .find(|spec| spec.required && !fields.contains_key(spec.name))
        {
            return Err(DomainError::validation(format!(
                "missing required field '{}'",
                missing.name
            )));
        }

        Ok(fields)
    }

    /// Validates a merge patch. `None` entries remove the field.
    pub fn validate_patch(
        &self,
        patch: Value,
        access: FieldAccess,
    ) -> Result<Vec<(String, Option<Value>)>, DomainError> {
        let patch = into_object(patch)?;
        if patch.is_empty() {
            return Err(DomainError::validation("update must contain at least one field"));
        }

        let mut changes = Vec::with_capacity(patch.len());
        for (name, value) in patch {
            let spec = self.check_entry(&name, &value, access)?;
            if !spec.updatable && access == FieldAccess::Client {
                return Err(DomainError::validation(format!(
                    "field '{}' cannot be changed after creation",
                    name
                )));
            }
            if value.is_null() {
                if spec.required {
                    return Err(DomainError::validation(format!(
                        "field '{}' is required and cannot be null",
                        name
                    )));
                }
                changes.push((name, None));
            } else {
                changes.push((name, Some(value)));
            }
        }
        Ok(changes)
    }

    pub fn owns(&self, actor: &Actor, record: &Record) -> bool {
        match (self.access.ownership, actor.user_id()) {
            (_, None) => false,
            (Ownership::Unowned, Some(_)) => true,
            (Ownership::Creator, Some(user)) => record.owner_id == Some(user),
            (Ownership::SelfRecord, Some(user)) => record.id == user,
        }
    }

    /// Case-insensitive substring match over the text fields.
    pub fn text_contains(&self, record: &Record, needle_lowercase: &str) -> bool {
        self.fields
            .iter()
            .filter(|spec| matches!(spec.kind, FieldKind::Text { .. }))
            .filter_map(|spec| record.fields.get(spec.name).and_then(Value::as_str))
            .any(|text| text.to_lowercase().contains(needle_lowercase))
    }

    fn check_entry(
        &self,
        name: &str,
        value: &Value,
        access: FieldAccess,
    ) -> Result<&FieldSpec, DomainError> {
        if RESERVED_FIELDS.contains(&name) {
            return Err(DomainError::validation(format!(
                "field '{}' is assigned by the server",
                name
            )));
        }
        let spec = self.spec(name).ok_or_else(|| {
            DomainError::validation(format!("unknown field '{}' for {}", name, self.name))
        })?;
        if !spec.writable && access == FieldAccess::Client {
            return Err(DomainError::validation(format!("field '{}' is read-only", name)));
        }
        if !value.is_null() {
            spec.kind
                .check(value)
                .map_err(|msg| DomainError::validation(format!("field '{}' {}", name, msg)))?;
        }
        Ok(spec)
    }
}

fn into_object(input: Value) -> Result<Fields, DomainError> {
    match input {
        Value::Object(map) => Ok(map),
        _ => Err(DomainError::validation("body must be a JSON object")),
    }
}
