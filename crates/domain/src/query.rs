use std::str::FromStr;

use claimlens_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::enforcer::MEMBER_EMAIL_DIMENSION;

/// One requested metric of an analytic query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    name: NonEmptyString,
}

impl Metric {
    /// Creates a validated metric reference.
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
        })
    }

    /// Returns the metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Time interval represented by a single point of a time dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGrain {
    /// Hourly grain.
    Hour,
    /// Daily grain.
    Day,
    /// Weekly grain.
    Week,
    /// Monthly grain.
    Month,
    /// Quarterly grain.
    Quarter,
    /// Yearly grain.
    Year,
}

impl TimeGrain {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

impl FromStr for TimeGrain {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(AppError::Validation(format!(
                "unknown time grain '{value}'"
            ))),
        }
    }
}

/// One grouping dimension of an analytic query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    name: NonEmptyString,
    grain: Option<TimeGrain>,
}

impl Dimension {
    /// Creates a validated dimension reference.
    pub fn new(name: impl Into<String>, grain: Option<TimeGrain>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            grain,
        })
    }

    /// Returns the dimension name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the time grain, when this is a time dimension.
    #[must_use]
    pub fn grain(&self) -> Option<TimeGrain> {
        self.grain
    }

    /// Returns the grain-qualified name used in result columns.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self.grain {
            Some(grain) => format!("{}__{}", self.name.as_str(), grain.as_str()),
            None => self.name.as_str().to_owned(),
        }
    }
}

/// Comparison operator of a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Equality comparison.
    Equals,
    /// Inequality comparison.
    NotEquals,
    /// Greater-than comparison.
    GreaterThan,
    /// Less-than comparison.
    LessThan,
    /// Membership in a provided set.
    In,
    /// Substring match for text values.
    Contains,
}

impl FilterOperator {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::NotEquals => "neq",
            Self::GreaterThan => "gt",
            Self::LessThan => "lt",
            Self::In => "in",
            Self::Contains => "contains",
        }
    }
}

impl FromStr for FilterOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "eq" => Ok(Self::Equals),
            "neq" => Ok(Self::NotEquals),
            "gt" => Ok(Self::GreaterThan),
            "lt" => Ok(Self::LessThan),
            "in" => Ok(Self::In),
            "contains" => Ok(Self::Contains),
            _ => Err(AppError::Validation(format!(
                "unknown filter operator '{value}'"
            ))),
        }
    }
}

/// One filter predicate of an analytic query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    dimension: NonEmptyString,
    operator: FilterOperator,
    value: String,
}

impl FilterPredicate {
    /// Creates a validated filter predicate.
    pub fn new(
        dimension: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            dimension: NonEmptyString::new(dimension)?,
            operator,
            value: value.into(),
        })
    }

    /// Returns the filtered dimension name.
    #[must_use]
    pub fn dimension(&self) -> &str {
        self.dimension.as_str()
    }

    /// Returns the comparison operator.
    #[must_use]
    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// Returns the comparison value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Returns true when this predicate constrains the member identity dimension.
    #[must_use]
    pub fn is_member_scope(&self) -> bool {
        self.dimension.as_str() == MEMBER_EMAIL_DIMENSION
    }
}

/// Ordering target referencing either a metric or a grouping dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTarget {
    /// Order by a requested metric.
    Metric(String),
    /// Order by a grouping dimension.
    Dimension(String),
}

/// One ordering clause of an analytic query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    target: OrderTarget,
    descending: bool,
}

impl OrderBy {
    /// Creates an ordering clause.
    #[must_use]
    pub fn new(target: OrderTarget, descending: bool) -> Self {
        Self { target, descending }
    }

    /// Returns the ordering target.
    #[must_use]
    pub fn target(&self) -> &OrderTarget {
        &self.target
    }

    /// Returns true for descending order.
    #[must_use]
    pub fn descending(&self) -> bool {
        self.descending
    }
}

/// Logical specification of one analytic request.
///
/// The filter set is private and mutable only through the filter enforcer,
/// which strips caller-supplied member-scope predicates and appends exactly
/// one equality predicate before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    metrics: Vec<Metric>,
    group_by: Vec<Dimension>,
    pub(crate) filters: Vec<FilterPredicate>,
    order_by: Vec<OrderBy>,
    limit: Option<u32>,
}

impl QuerySpec {
    /// Creates a validated query specification.
    pub fn new(
        metrics: Vec<Metric>,
        group_by: Vec<Dimension>,
        filters: Vec<FilterPredicate>,
        order_by: Vec<OrderBy>,
        limit: Option<u32>,
    ) -> AppResult<Self> {
        if metrics.is_empty() {
            return Err(AppError::Validation(
                "query must request at least one metric".to_owned(),
            ));
        }

        Ok(Self {
            metrics,
            group_by,
            filters,
            order_by,
            limit,
        })
    }

    /// Returns the requested metrics.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Returns the grouping dimensions.
    #[must_use]
    pub fn group_by(&self) -> &[Dimension] {
        &self.group_by
    }

    /// Returns the current filter set.
    #[must_use]
    pub fn filters(&self) -> &[FilterPredicate] {
        &self.filters
    }

    /// Returns the ordering clauses.
    #[must_use]
    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    /// Returns the row limit, if one was requested.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Returns the requested metric names.
    #[must_use]
    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.iter().map(Metric::name).collect()
    }
}
