//! Filter requests for SuperHero queries
//!
//! A [`SuperHeroCriteria`] holds one optional filter per field. Translation
//! produces a [`SuperHeroQuery`]: every operator set on a present filter adds
//! exactly one [`FilterCondition`], and all conditions are AND-combined.
//! `distinct` only sets the query flag.
//!
//! Criteria are usually decoded from query parameters of the form
//! `<field>.<operator>=<value>`, e.g.
//! `/api/super-heroes?age.greaterThan=18&name.contains=man&superpower.specified=true`.
//!
//! ```rust
//! use hero_service::criteria::SuperHeroCriteria;
//!
//! let pairs = vec![
//!     ("age.greaterThanOrEqual".to_string(), "18".to_string()),
//!     ("name.in".to_string(), "Storm,Rogue".to_string()),
//! ];
//! let criteria = SuperHeroCriteria::from_query_pairs(&pairs)?;
//! let query = SuperHeroCriteria::to_query(Some(&criteria));
//! assert_eq!(query.spec.conditions().len(), 2);
//! # Ok::<(), hero_service::criteria::CriteriaError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use crate::repository::{
    FilterCondition, FilterOperator, FilterValue, Specification, SuperHeroField, SuperHeroQuery,
};

/// Errors decoding filter or paging parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    /// A value could not be parsed for its parameter
    #[error("Invalid value '{value}' for parameter '{key}'")]
    InvalidValue {
        /// Parameter name
        key: String,
        /// Raw value
        value: String,
    },

    /// The operator does not exist or does not apply to the field's type
    #[error("Operator '{operator}' is not supported for field '{field}'")]
    UnsupportedOperator {
        /// Field name
        field: String,
        /// Operator name
        operator: String,
    },

    /// Invalid page, size or sort parameter
    #[error("Invalid paging parameter: {0}")]
    InvalidPaging(String),
}

/// Numeric types usable in a [`RangeFilter`]
pub trait RangeValue: Copy + FromStr + fmt::Debug + PartialEq {
    /// Widen to the filter operand type
    fn to_i64(self) -> i64;
}

impl RangeValue for i64 {
    fn to_i64(self) -> i64 {
        self
    }
}

impl RangeValue for i32 {
    fn to_i64(self) -> i64 {
        i64::from(self)
    }
}

/// Filter for an ordered numeric field
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter<T> {
    /// field = value
    pub equals: Option<T>,
    /// field <> value
    pub not_equals: Option<T>,
    /// field IN (values)
    pub in_list: Option<Vec<T>>,
    /// field NOT IN (values)
    pub not_in: Option<Vec<T>>,
    /// `true`: IS NOT NULL, `false`: IS NULL
    pub specified: Option<bool>,
    /// field > value
    pub greater_than: Option<T>,
    /// field < value
    pub less_than: Option<T>,
    /// field >= value
    pub greater_than_or_equal: Option<T>,
    /// field <= value
    pub less_than_or_equal: Option<T>,
}

impl<T> Default for RangeFilter<T> {
    fn default() -> Self {
        Self {
            equals: None,
            not_equals: None,
            in_list: None,
            not_in: None,
            specified: None,
            greater_than: None,
            less_than: None,
            greater_than_or_equal: None,
            less_than_or_equal: None,
        }
    }
}

impl<T: RangeValue> RangeFilter<T> {
    fn conditions(&self, field: SuperHeroField) -> Vec<FilterCondition> {
        let list = |values: &[T]| {
            FilterValue::IntegerList(values.iter().map(|v| v.to_i64()).collect())
        };
        let mut out = Vec::new();
        if let Some(v) = self.equals {
            out.push(FilterCondition::eq(field, v.to_i64()));
        }
        if let Some(v) = self.not_equals {
            out.push(FilterCondition::ne(field, v.to_i64()));
        }
        if let Some(values) = &self.in_list {
            out.push(FilterCondition::new(field, FilterOperator::In, list(values)));
        }
        if let Some(values) = &self.not_in {
            out.push(FilterCondition::new(field, FilterOperator::NotIn, list(values)));
        }
        if let Some(specified) = self.specified {
            out.push(specified_condition(field, specified));
        }
        if let Some(v) = self.greater_than {
            out.push(FilterCondition::gt(field, v.to_i64()));
        }
        if let Some(v) = self.less_than {
            out.push(FilterCondition::lt(field, v.to_i64()));
        }
        if let Some(v) = self.greater_than_or_equal {
            out.push(FilterCondition::gte(field, v.to_i64()));
        }
        if let Some(v) = self.less_than_or_equal {
            out.push(FilterCondition::lte(field, v.to_i64()));
        }
        out
    }

    fn set(&mut self, key: &str, operator: &str, raw: &str) -> Result<(), CriteriaError> {
        match operator {
            "equals" => self.equals = Some(parse_value(key, raw)?),
            "notEquals" => self.not_equals = Some(parse_value(key, raw)?),
            "in" => extend_list(&mut self.in_list, key, raw, parse_value)?,
            "notIn" => extend_list(&mut self.not_in, key, raw, parse_value)?,
            "specified" => self.specified = Some(parse_value(key, raw)?),
            "greaterThan" => self.greater_than = Some(parse_value(key, raw)?),
            "lessThan" => self.less_than = Some(parse_value(key, raw)?),
            "greaterThanOrEqual" => self.greater_than_or_equal = Some(parse_value(key, raw)?),
            "lessThanOrEqual" => self.less_than_or_equal = Some(parse_value(key, raw)?),
            _ => return Err(unsupported(key, operator)),
        }
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Display for RangeFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = FilterParts::new(f, "RangeFilter")?;
        parts.field("equals", &self.equals)?;
        parts.field("notEquals", &self.not_equals)?;
        parts.field("in", &self.in_list)?;
        parts.field("notIn", &self.not_in)?;
        parts.field("specified", &self.specified)?;
        parts.field("greaterThan", &self.greater_than)?;
        parts.field("lessThan", &self.less_than)?;
        parts.field("greaterThanOrEqual", &self.greater_than_or_equal)?;
        parts.field("lessThanOrEqual", &self.less_than_or_equal)?;
        parts.finish()
    }
}

/// Filter for a text field; all comparisons are case-sensitive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringFilter {
    /// field = value
    pub equals: Option<String>,
    /// field <> value
    pub not_equals: Option<String>,
    /// field IN (values)
    pub in_list: Option<Vec<String>>,
    /// field NOT IN (values)
    pub not_in: Option<Vec<String>>,
    /// `true`: IS NOT NULL, `false`: IS NULL
    pub specified: Option<bool>,
    /// field contains the exact substring
    pub contains: Option<String>,
    /// field does not contain the exact substring
    pub does_not_contain: Option<String>,
}

impl StringFilter {
    fn conditions(&self, field: SuperHeroField) -> Vec<FilterCondition> {
        let mut out = Vec::new();
        if let Some(v) = &self.equals {
            out.push(FilterCondition::eq(field, v.as_str()));
        }
        if let Some(v) = &self.not_equals {
            out.push(FilterCondition::ne(field, v.as_str()));
        }
        if let Some(values) = &self.in_list {
            out.push(FilterCondition::in_list(field, values.clone()));
        }
        if let Some(values) = &self.not_in {
            out.push(FilterCondition::not_in(field, values.clone()));
        }
        if let Some(specified) = self.specified {
            out.push(specified_condition(field, specified));
        }
        if let Some(v) = &self.contains {
            out.push(FilterCondition::contains(field, v.as_str()));
        }
        if let Some(v) = &self.does_not_contain {
            out.push(FilterCondition::not_contains(field, v.as_str()));
        }
        out
    }

    fn set(&mut self, key: &str, operator: &str, raw: &str) -> Result<(), CriteriaError> {
        let text = |_: &str, raw: &str| Ok::<_, CriteriaError>(raw.to_string());
        match operator {
            "equals" => self.equals = Some(raw.to_string()),
            "notEquals" => self.not_equals = Some(raw.to_string()),
            "in" => extend_list(&mut self.in_list, key, raw, text)?,
            "notIn" => extend_list(&mut self.not_in, key, raw, text)?,
            "specified" => self.specified = Some(parse_value(key, raw)?),
            "contains" => self.contains = Some(raw.to_string()),
            "doesNotContain" => self.does_not_contain = Some(raw.to_string()),
            _ => return Err(unsupported(key, operator)),
        }
        Ok(())
    }
}

impl fmt::Display for StringFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = FilterParts::new(f, "StringFilter")?;
        parts.field("equals", &self.equals)?;
        parts.field("notEquals", &self.not_equals)?;
        parts.field("in", &self.in_list)?;
        parts.field("notIn", &self.not_in)?;
        parts.field("specified", &self.specified)?;
        parts.field("contains", &self.contains)?;
        parts.field("doesNotContain", &self.does_not_contain)?;
        parts.finish()
    }
}

struct FilterParts<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
    first: bool,
}

impl<'a, 'b> FilterParts<'a, 'b> {
    fn new(f: &'a mut fmt::Formatter<'b>, name: &str) -> Result<Self, fmt::Error> {
        write!(f, "{} [", name)?;
        Ok(Self { f, first: true })
    }

    fn field<V: fmt::Debug>(&mut self, name: &str, value: &Option<V>) -> fmt::Result {
        if let Some(value) = value {
            if !self.first {
                write!(self.f, ", ")?;
            }
            self.first = false;
            write!(self.f, "{}={:?}", name, value)?;
        }
        Ok(())
    }

    fn finish(self) -> fmt::Result {
        write!(self.f, "]")
    }
}

fn specified_condition(field: SuperHeroField, specified: bool) -> FilterCondition {
    if specified {
        FilterCondition::is_not_null(field)
    } else {
        FilterCondition::is_null(field)
    }
}

fn parse_value<V: FromStr>(key: &str, raw: &str) -> Result<V, CriteriaError> {
    raw.trim().parse().map_err(|_| CriteriaError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Append comma-separated values; repeated keys accumulate and empty segments are skipped
fn extend_list<V>(
    target: &mut Option<Vec<V>>,
    key: &str,
    raw: &str,
    parse: impl Fn(&str, &str) -> Result<V, CriteriaError>,
) -> Result<(), CriteriaError> {
    let list = target.get_or_insert_with(Vec::new);
    for segment in raw.split(',').filter(|s| !s.is_empty()) {
        list.push(parse(key, segment)?);
    }
    Ok(())
}

fn unsupported(key: &str, operator: &str) -> CriteriaError {
    let field = key.split('.').next().unwrap_or(key);
    CriteriaError::UnsupportedOperator {
        field: field.to_string(),
        operator: operator.to_string(),
    }
}

/// Filters over SuperHero fields; an absent filter places no constraint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuperHeroCriteria {
    /// Filter on `id`
    pub id: Option<RangeFilter<i64>>,
    /// Filter on `name`
    pub name: Option<StringFilter>,
    /// Filter on `age`
    pub age: Option<RangeFilter<i32>>,
    /// Filter on `superpower`
    pub superpower: Option<StringFilter>,
    /// Request distinct rows
    pub distinct: Option<bool>,
}

impl SuperHeroCriteria {
    /// Criteria without any filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no filter and no distinct flag is set
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Translate optional criteria into a store query
    ///
    /// `None` matches every entity without the distinct flag.
    pub fn to_query(criteria: Option<&SuperHeroCriteria>) -> SuperHeroQuery {
        match criteria {
            Some(criteria) => SuperHeroQuery::new(criteria.specification())
                .distinct(criteria.distinct.unwrap_or(false)),
            None => SuperHeroQuery::all(),
        }
    }

    /// AND-combination of every set operator
    pub fn specification(&self) -> Specification {
        let mut conditions = Vec::new();
        if let Some(filter) = &self.id {
            conditions.extend(filter.conditions(SuperHeroField::Id));
        }
        if let Some(filter) = &self.name {
            conditions.extend(filter.conditions(SuperHeroField::Name));
        }
        if let Some(filter) = &self.age {
            conditions.extend(filter.conditions(SuperHeroField::Age));
        }
        if let Some(filter) = &self.superpower {
            conditions.extend(filter.conditions(SuperHeroField::Superpower));
        }
        conditions
            .into_iter()
            .fold(Specification::all(), Specification::and)
    }

    /// Decode `<field>.<operator>=<value>` and `distinct=<bool>` pairs
    ///
    /// Keys naming no SuperHero field (for example `page`, `size`, `sort`) are ignored.
    pub fn from_query_pairs(pairs: &[(String, String)]) -> Result<Self, CriteriaError> {
        let mut criteria = Self::default();
        for (key, value) in pairs {
            if key == "distinct" {
                criteria.distinct = Some(parse_value(key, value)?);
                continue;
            }
            let Some((field, operator)) = key.split_once('.') else {
                continue;
            };
            match SuperHeroField::from_name(field) {
                Some(SuperHeroField::Id) => criteria
                    .id
                    .get_or_insert_with(RangeFilter::default)
                    .set(key, operator, value)?,
                Some(SuperHeroField::Name) => criteria
                    .name
                    .get_or_insert_with(StringFilter::default)
                    .set(key, operator, value)?,
                Some(SuperHeroField::Age) => criteria
                    .age
                    .get_or_insert_with(RangeFilter::default)
                    .set(key, operator, value)?,
                Some(SuperHeroField::Superpower) => criteria
                    .superpower
                    .get_or_insert_with(StringFilter::default)
                    .set(key, operator, value)?,
                None => {}
            }
        }
        Ok(criteria)
    }
}

impl fmt::Display for SuperHeroCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SuperHeroCriteria{{")?;
        if let Some(id) = &self.id {
            write!(f, "id={}, ", id)?;
        }
        if let Some(name) = &self.name {
            write!(f, "name={}, ", name)?;
        }
        if let Some(age) = &self.age {
            write!(f, "age={}, ", age)?;
        }
        if let Some(superpower) = &self.superpower {
            write!(f, "superpower={}, ", superpower)?;
        }
        if let Some(distinct) = self.distinct {
            write!(f, "distinct={}, ", distinct)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SuperHero;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_none_criteria_matches_everything() {
        let query = SuperHeroCriteria::to_query(None);
        assert!(query.spec.is_empty());
        assert!(!query.distinct);
    }

    #[test]
    fn test_distinct_is_a_flag_not_a_clause() {
        let criteria = SuperHeroCriteria {
            distinct: Some(true),
            ..SuperHeroCriteria::default()
        };
        let query = SuperHeroCriteria::to_query(Some(&criteria));
        assert!(query.distinct);
        assert!(query.spec.is_empty());
    }

    #[test]
    fn test_one_condition_per_operator() {
        let criteria = SuperHeroCriteria {
            id: Some(RangeFilter {
                greater_than: Some(5),
                less_than_or_equal: Some(10),
                ..RangeFilter::default()
            }),
            name: Some(StringFilter {
                contains: Some("man".to_string()),
                ..StringFilter::default()
            }),
            superpower: Some(StringFilter {
                specified: Some(false),
                ..StringFilter::default()
            }),
            ..SuperHeroCriteria::default()
        };
        let spec = criteria.specification();
        assert_eq!(
            spec.conditions(),
            &[
                FilterCondition::gt(SuperHeroField::Id, 5_i64),
                FilterCondition::lte(SuperHeroField::Id, 10_i64),
                FilterCondition::contains(SuperHeroField::Name, "man"),
                FilterCondition::is_null(SuperHeroField::Superpower),
            ]
        );
    }

    #[test]
    fn test_strict_and_inclusive_bounds() {
        let hero = SuperHero::new().with_id(1).with_age(30);
        let strict = SuperHeroCriteria {
            age: Some(RangeFilter {
                greater_than: Some(30),
                ..RangeFilter::default()
            }),
            ..SuperHeroCriteria::default()
        };
        let inclusive = SuperHeroCriteria {
            age: Some(RangeFilter {
                greater_than_or_equal: Some(30),
                ..RangeFilter::default()
            }),
            ..SuperHeroCriteria::default()
        };
        assert!(!strict.specification().matches(&hero));
        assert!(inclusive.specification().matches(&hero));
    }

    #[test]
    fn test_conjunction_across_fields() {
        let criteria = SuperHeroCriteria::from_query_pairs(&pairs(&[
            ("name.equals", "Storm"),
            ("age.lessThan", "40"),
        ]))
        .unwrap();
        let spec = criteria.specification();
        let storm = SuperHero::new().with_id(1).with_name("Storm").with_age(30);
        let old_storm = SuperHero::new().with_id(2).with_name("Storm").with_age(50);
        let rogue = SuperHero::new().with_id(3).with_name("Rogue").with_age(20);
        assert!(spec.matches(&storm));
        assert!(!spec.matches(&old_storm));
        assert!(!spec.matches(&rogue));
    }

    #[test]
    fn test_parse_lists_accumulate() {
        let criteria = SuperHeroCriteria::from_query_pairs(&pairs(&[
            ("id.in", "1,2"),
            ("id.in", "3"),
            ("superpower.notIn", "fly,,swim"),
        ]))
        .unwrap();
        assert_eq!(criteria.id.unwrap().in_list, Some(vec![1, 2, 3]));
        assert_eq!(
            criteria.superpower.unwrap().not_in,
            Some(vec!["fly".to_string(), "swim".to_string()])
        );
    }

    #[test]
    fn test_parse_empty_in_matches_nothing() {
        let criteria = SuperHeroCriteria::from_query_pairs(&pairs(&[("age.in", "")])).unwrap();
        let hero = SuperHero::new().with_id(1).with_age(30);
        assert!(!criteria.specification().matches(&hero));
    }

    #[test]
    fn test_parse_ignores_non_criteria_keys() {
        let criteria = SuperHeroCriteria::from_query_pairs(&pairs(&[
            ("page", "1"),
            ("size", "20"),
            ("sort", "id,desc"),
            ("power.equals", "x"),
        ]))
        .unwrap();
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_numbers() {
        let err = SuperHeroCriteria::from_query_pairs(&pairs(&[("age.equals", "old")])).unwrap_err();
        assert_eq!(
            err,
            CriteriaError::InvalidValue {
                key: "age.equals".to_string(),
                value: "old".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_wrong_operator_for_type() {
        let err =
            SuperHeroCriteria::from_query_pairs(&pairs(&[("age.contains", "3")])).unwrap_err();
        assert!(matches!(err, CriteriaError::UnsupportedOperator { .. }));

        let err =
            SuperHeroCriteria::from_query_pairs(&pairs(&[("name.greaterThan", "a")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operator 'greaterThan' is not supported for field 'name'"
        );
    }

    #[test]
    fn test_parse_specified_and_distinct() {
        let criteria = SuperHeroCriteria::from_query_pairs(&pairs(&[
            ("name.specified", "true"),
            ("distinct", "true"),
        ]))
        .unwrap();
        let query = SuperHeroCriteria::to_query(Some(&criteria));
        assert!(query.distinct);
        assert_eq!(
            query.spec.conditions(),
            &[FilterCondition::is_not_null(SuperHeroField::Name)]
        );

        assert!(SuperHeroCriteria::from_query_pairs(&pairs(&[("distinct", "maybe")])).is_err());
    }

    #[test]
    fn test_clone_is_deep() {
        let original = SuperHeroCriteria::from_query_pairs(&pairs(&[("id.in", "1,2")])).unwrap();
        let mut copy = original.clone();
        if let Some(id) = copy.id.as_mut() {
            id.in_list = Some(vec![9]);
        }
        assert_eq!(original.id.unwrap().in_list, Some(vec![1, 2]));
    }

    #[test]
    fn test_display() {
        let criteria = SuperHeroCriteria::from_query_pairs(&pairs(&[
            ("age.greaterThan", "3"),
            ("name.equals", "A"),
        ]))
        .unwrap();
        assert_eq!(
            criteria.to_string(),
            "SuperHeroCriteria{name=StringFilter [equals=\"A\"], age=RangeFilter [greaterThan=3], }"
        );
        assert_eq!(SuperHeroCriteria::new().to_string(), "SuperHeroCriteria{}");
    }
}
