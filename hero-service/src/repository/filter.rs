//! Filter conditions and AND-combined specifications over SuperHero fields
//!
//! A [`Specification`] is an immutable list of [`FilterCondition`]s that all
//! must hold. It is evaluated in memory with [`Specification::matches`] and
//! rendered to SQL by the Postgres repository. Both follow SQL null semantics:
//! every comparison against a null column is false, and only
//! [`FilterOperator::IsNull`] matches a null.
//!
//! # Example
//!
//! ```rust
//! use hero_service::domain::SuperHero;
//! use hero_service::repository::{FilterCondition, Specification, SuperHeroField};
//!
//! let spec = Specification::all()
//!     .and(FilterCondition::gte(SuperHeroField::Age, 18))
//!     .and(FilterCondition::contains(SuperHeroField::Name, "man"));
//!
//! let hero = SuperHero::new().with_id(1).with_name("Batman").with_age(40);
//! assert!(spec.matches(&hero));
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::domain::SuperHero;

/// Filterable and sortable SuperHero attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuperHeroField {
    /// `id` column
    Id,
    /// `name` column
    Name,
    /// `age` column
    Age,
    /// `superpower` column
    Superpower,
}

impl SuperHeroField {
    /// All fields in declaration order
    pub const ALL: [SuperHeroField; 4] = [Self::Id, Self::Name, Self::Age, Self::Superpower];

    /// Column name in the `super_hero` table
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Age => "age",
            Self::Superpower => "superpower",
        }
    }

    /// Look up a field by its JSON/query name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == name)
    }

    fn value_of(self, entity: &SuperHero) -> Option<FieldRef<'_>> {
        match self {
            Self::Id => entity.id.map(FieldRef::Integer),
            Self::Name => entity.name.as_deref().map(FieldRef::Text),
            Self::Age => entity.age.map(|age| FieldRef::Integer(i64::from(age))),
            Self::Superpower => entity.superpower.as_deref().map(FieldRef::Text),
        }
    }

    /// Order two entities by this field
    ///
    /// Nulls sort after every value, matching Postgres `ASC` ordering.
    pub fn compare(self, a: &SuperHero, b: &SuperHero) -> Ordering {
        match (self.value_of(a), self.value_of(b)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl fmt::Display for SuperHeroField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum FieldRef<'a> {
    Integer(i64),
    Text(&'a str),
}

/// Comparison operators for filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Not equal to (<>)
    NotEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal to (<=)
    LessThanOrEqual,
    /// Exact substring match
    Contains,
    /// Negated exact substring match
    NotContains,
    /// Value is in a list (IN)
    In,
    /// Value is not in a list (NOT IN)
    NotIn,
    /// Value is null (IS NULL)
    IsNull,
    /// Value is not null (IS NOT NULL)
    IsNotNull,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "<>"),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Contains => write!(f, "CONTAINS"),
            Self::NotContains => write!(f, "NOT CONTAINS"),
            Self::In => write!(f, "IN"),
            Self::NotIn => write!(f, "NOT IN"),
            Self::IsNull => write!(f, "IS NULL"),
            Self::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// Operand of a filter condition
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Integer operand
    Integer(i64),
    /// String operand
    String(String),
    /// Integer list (for IN / NOT IN)
    IntegerList(Vec<i64>),
    /// String list (for IN / NOT IN)
    StringList(Vec<String>),
    /// No operand (for IS NULL / IS NOT NULL)
    Null,
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(list: Vec<i64>) -> Self {
        Self::IntegerList(list)
    }
}

impl From<Vec<i32>> for FilterValue {
    fn from(list: Vec<i32>) -> Self {
        Self::IntegerList(list.into_iter().map(i64::from).collect())
    }
}

/// A single predicate on one SuperHero field
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// The field to filter on
    pub field: SuperHeroField,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The operand
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a filter condition from its parts
    pub fn new(field: SuperHeroField, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }

    /// field = value
    pub fn eq(field: SuperHeroField, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// field <> value
    pub fn ne(field: SuperHeroField, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::NotEqual, value.into())
    }

    /// field > value
    pub fn gt(field: SuperHeroField, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value.into())
    }

    /// field >= value
    pub fn gte(field: SuperHeroField, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value.into())
    }

    /// field < value
    pub fn lt(field: SuperHeroField, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value.into())
    }

    /// field <= value
    pub fn lte(field: SuperHeroField, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value.into())
    }

    /// field contains the exact substring
    pub fn contains(field: SuperHeroField, value: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Contains, FilterValue::String(value.into()))
    }

    /// field does not contain the exact substring
    pub fn not_contains(field: SuperHeroField, value: impl Into<String>) -> Self {
        Self::new(
            field,
            FilterOperator::NotContains,
            FilterValue::String(value.into()),
        )
    }

    /// field IN (values)
    pub fn in_list(field: SuperHeroField, values: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::In, values.into())
    }

    /// field NOT IN (values)
    pub fn not_in(field: SuperHeroField, values: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::NotIn, values.into())
    }

    /// field IS NULL
    pub fn is_null(field: SuperHeroField) -> Self {
        Self::new(field, FilterOperator::IsNull, FilterValue::Null)
    }

    /// field IS NOT NULL
    pub fn is_not_null(field: SuperHeroField) -> Self {
        Self::new(field, FilterOperator::IsNotNull, FilterValue::Null)
    }

    /// Evaluate this condition against an entity
    pub fn matches(&self, entity: &SuperHero) -> bool {
        let actual = self.field.value_of(entity);
        match self.operator {
            FilterOperator::IsNull => return actual.is_none(),
            FilterOperator::IsNotNull => return actual.is_some(),
            _ => {}
        }
        let Some(actual) = actual else {
            return false;
        };

        match (self.operator, &self.value, actual) {
            (op, FilterValue::Integer(expected), FieldRef::Integer(actual)) => {
                compare(op, actual.cmp(expected))
            }
            (op, FilterValue::String(expected), FieldRef::Text(actual)) => match op {
                FilterOperator::Contains => actual.contains(expected.as_str()),
                FilterOperator::NotContains => !actual.contains(expected.as_str()),
                _ => compare(op, actual.cmp(expected.as_str())),
            },
            (FilterOperator::In, FilterValue::IntegerList(list), FieldRef::Integer(actual)) => {
                list.contains(&actual)
            }
            (FilterOperator::NotIn, FilterValue::IntegerList(list), FieldRef::Integer(actual)) => {
                !list.contains(&actual)
            }
            (FilterOperator::In, FilterValue::StringList(list), FieldRef::Text(actual)) => {
                list.iter().any(|item| item == actual)
            }
            (FilterOperator::NotIn, FilterValue::StringList(list), FieldRef::Text(actual)) => {
                !list.iter().any(|item| item == actual)
            }
            _ => false,
        }
    }
}

fn compare(operator: FilterOperator, ordering: Ordering) -> bool {
    match operator {
        FilterOperator::Equal => ordering == Ordering::Equal,
        FilterOperator::NotEqual => ordering != Ordering::Equal,
        FilterOperator::GreaterThan => ordering == Ordering::Greater,
        FilterOperator::GreaterThanOrEqual => ordering != Ordering::Less,
        FilterOperator::LessThan => ordering == Ordering::Less,
        FilterOperator::LessThanOrEqual => ordering != Ordering::Greater,
        _ => false,
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            FilterValue::Null => write!(f, "{} {}", self.field, self.operator),
            FilterValue::Integer(n) => write!(f, "{} {} {}", self.field, self.operator, n),
            FilterValue::String(s) => write!(f, "{} {} '{}'", self.field, self.operator, s),
            FilterValue::IntegerList(list) => {
                write!(f, "{} {} {:?}", self.field, self.operator, list)
            }
            FilterValue::StringList(list) => {
                write!(f, "{} {} {:?}", self.field, self.operator, list)
            }
        }
    }
}

/// Conjunction of filter conditions
///
/// An empty specification matches every entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Specification {
    conditions: Vec<FilterCondition>,
}

impl Specification {
    /// Specification that matches everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a condition that must also hold
    #[must_use]
    pub fn and(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// The conditions in insertion order
    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    /// Whether no condition constrains the result
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate every condition against an entity
    pub fn matches(&self, entity: &SuperHero) -> bool {
        self.conditions.iter().all(|condition| condition.matches(entity))
    }
}

impl fmt::Display for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "TRUE");
        }
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", condition)?;
        }
        Ok(())
    }
}

/// Store query: a specification plus the distinct flag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuperHeroQuery {
    /// Conditions every returned row satisfies
    pub spec: Specification,
    /// Collapse duplicate rows
    pub distinct: bool,
}

impl SuperHeroQuery {
    /// Query matching every entity
    pub fn all() -> Self {
        Self::default()
    }

    /// Query for the given specification
    pub fn new(spec: Specification) -> Self {
        Self {
            spec,
            distinct: false,
        }
    }

    /// Set the distinct flag
    #[must_use]
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }
}
