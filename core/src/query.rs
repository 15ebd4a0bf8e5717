//! Conference query translation.
//!
//! Turns the declarative [`ConferenceQueryForm`] into a store-independent
//! [`ConferenceQuery`]: a list of predicates plus a sort order. Stores either
//! evaluate the query directly ([`ConferenceQuery::matches`] and
//! [`ConferenceQuery::sort`]) or compile it to their own query language.
//!
//! Inequality filters (anything but `EQ`) may only target a single field.
//! When one is present results are ordered by that field first and then by
//! name; otherwise by name alone.

use crate::types::Conference;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

// ============================================================================
// Form
// ============================================================================

/// Filterable conference field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Field {
    /// Host city (text)
    City,
    /// Topic membership (text, equality only)
    Topic,
    /// Start month (number)
    Month,
    /// Capacity (number)
    MaxAttendees,
    /// Seats left (number)
    SeatsAvailable,
}

impl Field {
    /// Whether values for this field are parsed as numbers
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Month | Self::MaxAttendees | Self::SeatsAvailable)
    }

    /// Wire name of the field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::City => "CITY",
            Self::Topic => "TOPIC",
            Self::Month => "MONTH",
            Self::MaxAttendees => "MAX_ATTENDEES",
            Self::SeatsAvailable => "SEATS_AVAILABLE",
        }
    }
}

/// Comparison operator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Lteq,
    /// `>=`
    Gteq,
    /// `!=`
    Ne,
}

impl Operator {
    /// Every operator except `EQ` is an inequality
    #[must_use]
    pub const fn is_inequality(self) -> bool {
        !matches!(self, Self::Eq)
    }

    /// SQL spelling of the operator
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lteq => "<=",
            Self::Gteq => ">=",
            Self::Ne => "<>",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Gt => ordering == Ordering::Greater,
            Self::Lteq => ordering != Ordering::Greater,
            Self::Gteq => ordering != Ordering::Less,
            Self::Ne => ordering != Ordering::Equal,
        }
    }
}

/// One filter of the query form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Field to compare
    pub field: Field,
    /// Comparison
    pub operator: Operator,
    /// Right-hand side, as typed by the client
    pub value: String,
}

impl Filter {
    /// Creates a new filter
    #[must_use]
    pub fn new(field: Field, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
        }
    }
}

/// Input of `queryConferences`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConferenceQueryForm {
    /// Filters, all of which must hold
    pub filters: Vec<Filter>,
}

impl ConferenceQueryForm {
    /// Adds a filter
    #[must_use]
    pub fn filter(mut self, field: Field, operator: Operator, value: impl Into<String>) -> Self {
        self.filters.push(Filter::new(field, operator, value));
        self
    }
}

/// Reasons a query form is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Inequality filters on more than one field
    #[error("Inequality filter is allowed on only one field: {first} and {second} both use one")]
    MultipleInequalityFields {
        /// First field seen with an inequality
        first: &'static str,
        /// Conflicting field
        second: &'static str,
    },

    /// `TOPIC` only supports `EQ`
    #[error("Field {field} only supports the EQ operator")]
    UnsupportedOperator {
        /// Offending field
        field: &'static str,
    },

    /// Numeric field with a non-numeric value
    #[error("Field {field} expects a non-negative integer, got '{value}'")]
    InvalidNumber {
        /// Offending field
        field: &'static str,
        /// Value as received
        value: String,
    },
}

// ============================================================================
// Translated query
// ============================================================================

/// Typed right-hand side of a predicate
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    /// Text comparison
    Text(String),
    /// Numeric comparison
    Number(u32),
}

/// A validated filter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Predicate {
    /// Field compared
    pub field: Field,
    /// Comparison
    pub operator: Operator,
    /// Typed value
    pub value: FilterValue,
}

impl Predicate {
    /// Evaluates the predicate against a conference.
    ///
    /// `TOPIC` holds when any topic equals the value; an absent city never
    /// matches.
    #[must_use]
    pub fn matches(&self, conference: &Conference) -> bool {
        match (&self.field, &self.value) {
            (Field::Topic, FilterValue::Text(topic)) => {
                conference.topics.iter().any(|t| t == topic)
            }
            (Field::City, FilterValue::Text(city)) => conference
                .city
                .as_deref()
                .is_some_and(|actual| self.operator.accepts(actual.cmp(city.as_str()))),
            (field, FilterValue::Number(expected)) => numeric_value(conference, *field)
                .is_some_and(|actual| self.operator.accepts(actual.cmp(expected))),
            _ => false,
        }
    }
}

fn numeric_value(conference: &Conference, field: Field) -> Option<u32> {
    match field {
        Field::Month => Some(conference.month),
        Field::MaxAttendees => Some(conference.max_attendees),
        Field::SeatsAvailable => Some(conference.seats_available),
        Field::City | Field::Topic => None,
    }
}

/// Sortable column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// Sort by an inequality field
    Field(Field),
    /// Sort by conference name
    Name,
}

/// Store-independent conference query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConferenceQuery {
    predicates: Vec<Predicate>,
    order: Vec<SortKey>,
}

impl Default for ConferenceQuery {
    fn default() -> Self {
        Self::all()
    }
}

impl ConferenceQuery {
    /// Every conference, ordered by name
    #[must_use]
    pub fn all() -> Self {
        Self {
            predicates: Vec::new(),
            order: vec![SortKey::Name],
        }
    }

    /// Translates a query form.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when inequalities span more than one field,
    /// when `TOPIC` is used with anything but `EQ`, or when a numeric field
    /// receives a value that is not a non-negative integer.
    pub fn from_form(form: &ConferenceQueryForm) -> Result<Self, QueryError> {
        let mut inequality_field: Option<Field> = None;
        let mut predicates = Vec::with_capacity(form.filters.len());

        for filter in &form.filters {
            if filter.field == Field::Topic && filter.operator.is_inequality() {
                return Err(QueryError::UnsupportedOperator {
                    field: filter.field.as_str(),
                });
            }

            if filter.operator.is_inequality() {
                match inequality_field {
                    Some(existing) if existing != filter.field => {
                        return Err(QueryError::MultipleInequalityFields {
                            first: existing.as_str(),
                            second: filter.field.as_str(),
                        });
                    }
                    _ => inequality_field = Some(filter.field),
                }
            }

            let value = if filter.field.is_numeric() {
                let number = filter.value.trim().parse::<u32>().map_err(|_| {
                    QueryError::InvalidNumber {
                        field: filter.field.as_str(),
                        value: filter.value.clone(),
                    }
                })?;
                FilterValue::Number(number)
            } else {
                FilterValue::Text(filter.value.clone())
            };

            predicates.push(Predicate {
                field: filter.field,
                operator: filter.operator,
                value,
            });
        }

        let order = match inequality_field {
            Some(field) => vec![SortKey::Field(field), SortKey::Name],
            None => vec![SortKey::Name],
        };

        Ok(Self { predicates, order })
    }

    /// Validated predicates, all of which must hold
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Sort keys, most significant first
    #[must_use]
    pub fn order(&self) -> &[SortKey] {
        &self.order
    }

    /// Whether a conference satisfies every predicate
    #[must_use]
    pub fn matches(&self, conference: &Conference) -> bool {
        self.predicates.iter().all(|p| p.matches(conference))
    }

    /// Orders conferences by the query's sort keys
    pub fn sort(&self, conferences: &mut [Conference]) {
        conferences.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(&self, a: &Conference, b: &Conference) -> Ordering {
        self.order
            .iter()
            .map(|key| match key {
                SortKey::Name => a.name.cmp(&b.name),
                SortKey::Field(Field::City) => a.city.cmp(&b.city),
                SortKey::Field(field) => {
                    numeric_value(a, *field).cmp(&numeric_value(b, *field))
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.key.id().cmp(&b.key.id()))
    }

    /// Filters and sorts an iterator of conferences
    #[must_use]
    pub fn apply(&self, conferences: impl IntoIterator<Item = Conference>) -> Vec<Conference> {
        let mut matched: Vec<Conference> = conferences
            .into_iter()
            .filter(|c| self.matches(c))
            .collect();
        self.sort(&mut matched);
        matched
    }
}
