//! List filters, ordering and pagination

use std::cmp::Ordering;
use std::collections::HashMap;

use aula_shared::{Pagination, RecordId};

use crate::domain::{CollectionSchema, Record};
use crate::error::DomainError;

/// A single list filter. Filters never fail: an unknown field or a value
/// that does not parse for the field's kind simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Equals { field: String, raw: String },
    /// Inclusive lower bound, numeric and timestamp fields only.
    Min { field: String, raw: String },
    /// Inclusive upper bound, numeric and timestamp fields only.
    Max { field: String, raw: String },
    Owner(String),
}

impl Filter {
    pub fn matches(&self, schema: &CollectionSchema, record: &Record) -> bool {
        match self {
            Filter::Owner(raw) => raw
                .trim()
                .parse::<RecordId>()
                .is_ok_and(|owner| record.owner_id == Some(owner)),
            Filter::Equals { field, raw } => {
                compare_field(schema, record, field, raw) == Some(Ordering::Equal)
            }
            Filter::Min { field, raw } => {
                is_ranged(schema, field)
                    && matches!(
                        compare_field(schema, record, field, raw),
                        Some(Ordering::Greater | Ordering::Equal)
                    )
            }
            Filter::Max { field, raw } => {
                is_ranged(schema, field)
                    && matches!(
                        compare_field(schema, record, field, raw),
                        Some(Ordering::Less | Ordering::Equal)
                    )
            }
        }
    }
}

fn is_ranged(schema: &CollectionSchema, field: &str) -> bool {
    schema.kind_of(field).is_some_and(|kind| kind.is_ranged())
}

fn compare_field(
    schema: &CollectionSchema,
    record: &Record,
    field: &str,
    raw: &str,
) -> Option<Ordering> {
    let kind = schema.kind_of(field)?;
    let target = kind.parse_query(raw)?;
    let value = schema.effective(record, field)?;
    kind.compare(&value, &target)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    /// Lower-cased search term matched against text fields.
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
    pub page: Pagination,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a query from query-string pairs.
    ///
    /// Reserved keys: `skip`, `limit`, `order_by`, `order` (`asc`/`desc`),
    /// `q`, `owner_id`. `<field>_min` / `<field>_max` become range filters
    /// and every other key is an equality filter.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, DomainError> {
        let mut query = ListQuery::new();
        let mut skip = query.page.skip;
        let mut limit = query.page.limit;
        let mut order_by: Option<String> = None;
        let mut descending = false;

        for (key, value) in params {
            match key.as_str() {
                "skip" => skip = parse_count("skip", value)?,
                "limit" => limit = parse_count("limit", value)?,
                "order_by" => order_by = Some(value.clone()),
                "order" => {
                    descending = match value.to_ascii_lowercase().as_str() {
                        "asc" => false,
                        "desc" => true,
                        _ => {
                            return Err(DomainError::validation(
                                "order must be either 'asc' or 'desc'",
                            ))
                        }
                    }
                }
                "q" => {
                    if !value.trim().is_empty() {
                        query.search = Some(value.trim().to_lowercase());
                    }
                }
                "owner_id" => query.filters.push(Filter::Owner(value.clone())),
                _ => query.filters.push(field_filter(key, value)),
            }
        }

        query.page = Pagination::new(skip, limit);
        if order_by.is_some() || descending {
            query.sort = Some(SortOrder {
                field: order_by.unwrap_or_else(|| "id".to_string()),
                descending,
            });
        }
        Ok(query)
    }

    /// Filters, orders and paginates `records`, which must be in id order.
    pub fn apply<'a>(
        &self,
        schema: &CollectionSchema,
        records: impl Iterator<Item = &'a Record>,
    ) -> Result<Vec<Record>, DomainError> {
        if let Some(sort) = &self.sort {
            if sort.field != "id" && schema.kind_of(&sort.field).is_none() {
                return Err(DomainError::validation(format!(
                    "cannot order {} by unknown field '{}'",
                    schema.name, sort.field
                )));
            }
        }

        let mut matched: Vec<&Record> = records
            .filter(|record| self.filters.iter().all(|f| f.matches(schema, record)))
            .filter(|record| match &self.search {
                Some(term) => schema.text_contains(record, term),
                None => true,
            })
            .collect();

        if let Some(sort) = &self.sort {
            matched.sort_by(|a, b| compare_for_sort(schema, sort, a, b));
        }

        Ok(matched
            .into_iter()
            .skip(self.page.skip)
            .take(self.page.limit)
            .cloned()
            .collect())
    }
}

fn parse_count(name: &str, value: &str) -> Result<usize, DomainError> {
    value.trim().parse::<usize>().map_err(|_| {
        DomainError::validation(format!("{} must be a non-negative integer", name))
    })
}

fn field_filter(key: &str, value: &str) -> Filter {
    let raw = value.to_string();
    if let Some(field) = key.strip_suffix("_min").filter(|f| !f.is_empty()) {
        Filter::Min { field: field.to_string(), raw }
    } else if let Some(field) = key.strip_suffix("_max").filter(|f| !f.is_empty()) {
        Filter::Max { field: field.to_string(), raw }
    } else {
        Filter::Equals { field: key.to_string(), raw }
    }
}

/// Records missing the sort field go last in either direction; ties keep id order.
fn compare_for_sort(
    schema: &CollectionSchema,
    sort: &SortOrder,
    a: &Record,
    b: &Record,
) -> Ordering {
    let directed = |ordering: Ordering| {
        if sort.descending {
            ordering.reverse()
        } else {
            ordering
        }
    };

    if sort.field == "id" {
        return directed(a.id.cmp(&b.id));
    }

    let primary = match (
        schema.kind_of(&sort.field),
        schema.effective(a, &sort.field),
        schema.effective(b, &sort.field),
    ) {
        (Some(kind), Some(va), Some(vb)) => {
            directed(kind.compare(&va, &vb).unwrap_or(Ordering::Equal))
        }
        (_, Some(_), None) => Ordering::Less,
        (_, None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    };
    primary.then(a.id.cmp(&b.id))
}
