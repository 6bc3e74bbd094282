//! Allow-listed filter, order and search grammar for list endpoints
//!
//! Raw query strings are parsed into a small tagged grammar and then replayed
//! against a [`QueryBuilder`]. Nothing here knows about the database; see
//! [`sea`] for the SeaORM implementation.
//!
//! - `filter`: comma separated `key:value` conditions, ANDed. `key` may carry a
//!   lookup suffix (`cost__gt`) or a relation path (`operation__type`).
//!   Keys that are not allow-listed are dropped without error.
//! - `order`: comma separated field names, `-` prefix for descending.
//! - `search`: one token, case-insensitive substring match ORed across the
//!   search fields.

pub mod pagination;
pub mod sea;

use thiserror::Error;

/// Separator between relation hops and lookup suffixes in a field path
pub const LOOKUP_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
}

impl FilterOperator {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "eq" => Some(FilterOperator::Eq),
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "lt" => Some(FilterOperator::Lt),
            "lte" => Some(FilterOperator::Lte),
            "contains" => Some(FilterOperator::Contains),
            _ => None,
        }
    }
}

/// One `key:value` condition, with the lookup suffix split off the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
    /// Field path without the lookup suffix, e.g. `operation__type`
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterCondition {
    pub fn from_key(key: &str, value: &str) -> Self {
        if let Some((field, suffix)) = key.rsplit_once(LOOKUP_SEPARATOR) {
            if let Some(operator) = FilterOperator::from_suffix(suffix) {
                return Self {
                    field: field.to_string(),
                    operator,
                    value: value.to_string(),
                };
            }
        }
        Self {
            field: key.to_string(),
            operator: FilterOperator::Eq,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Malformed filter condition '{0}', expected key:value")]
    MalformedCondition(String),
    #[error("Invalid value '{value}' for filter on '{field}'")]
    InvalidValue { field: String, value: String },
    #[error("Lookup not supported on field '{0}'")]
    UnsupportedLookup(String),
    #[error("Field '{0}' cannot be resolved")]
    UnknownField(String),
}

/// Fields an endpoint exposes for filtering, ordering and searching.
///
/// Filter entries are matched against the raw key literally, so `cost__gt`
/// must be listed on its own to allow that lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowList {
    pub filter: &'static [&'static str],
    pub order: &'static [&'static str],
    pub search: &'static [&'static str],
}

/// Parse the `filter` parameter, dropping keys outside `allowed`.
pub fn parse_filter(raw: &str, allowed: &[&str]) -> Result<Vec<FilterCondition>, QueryError> {
    let mut conditions = Vec::new();

    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let mut parts = token.split(':');
        let (key, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) if !key.trim().is_empty() => (key.trim(), value.trim()),
            _ => return Err(QueryError::MalformedCondition(token.to_string())),
        };

        if !allowed.contains(&key) {
            tracing::debug!(key, "Dropping filter on field outside allow-list");
            continue;
        }

        conditions.push(FilterCondition::from_key(key, value));
    }

    Ok(conditions)
}

/// Parse the `order` parameter, dropping fields outside `allowed`.
pub fn parse_order(raw: &str, allowed: &[&str]) -> Vec<OrderTerm> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter_map(|token| {
            let (field, direction) = match token.strip_prefix('-') {
                Some(field) => (field.trim(), SortDirection::Desc),
                None => (token, SortDirection::Asc),
            };
            if !allowed.contains(&field) {
                tracing::debug!(field, "Dropping order on field outside allow-list");
                return None;
            }
            Some(OrderTerm {
                field: field.to_string(),
                direction,
            })
        })
        .collect()
}

/// Everything a list endpoint needs besides pagination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub search_fields: &'static [&'static str],
    pub filters: Vec<FilterCondition>,
    pub order: Vec<OrderTerm>,
}

impl ListQuery {
    pub fn parse(
        allow: &AllowList,
        filter: Option<&str>,
        order: Option<&str>,
        search: Option<&str>,
    ) -> Result<Self, QueryError> {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty() && !allow.search.is_empty())
            .map(str::to_string);

        Ok(Self {
            search,
            search_fields: allow.search,
            filters: parse_filter(filter.unwrap_or_default(), allow.filter)?,
            order: parse_order(order.unwrap_or_default(), allow.order),
        })
    }

    /// Replay search, then filters, then ordering onto `builder`.
    pub fn apply<B: QueryBuilder>(&self, builder: B) -> Result<B, B::Error> {
        let mut builder = builder;

        if let Some(term) = &self.search {
            builder = builder.search(term, self.search_fields)?;
        }

        for condition in &self.filters {
            builder = builder.filter(condition)?;
        }

        if self.order.is_empty() {
            builder = builder.default_order();
        } else {
            for term in &self.order {
                builder = builder.order_by(term)?;
            }
        }

        Ok(builder)
    }
}

/// Store-side target of a parsed [`ListQuery`]
pub trait QueryBuilder: Sized {
    type Error: From<QueryError>;

    /// Case-insensitive substring match of `term`, ORed across `fields`
    fn search(self, term: &str, fields: &[&str]) -> Result<Self, Self::Error>;

    fn filter(self, condition: &FilterCondition) -> Result<Self, Self::Error>;

    /// Append an ordering key after any previous ones
    fn order_by(self, term: &OrderTerm) -> Result<Self, Self::Error>;

    /// Ordering used when the caller asked for none
    fn default_order(self) -> Self;
}
