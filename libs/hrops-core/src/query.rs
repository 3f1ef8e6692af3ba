//! Declarative filters and query options for entity reads
//!
//! [`QueryFilters`] keeps one ordered list per comparison category. All
//! categories are combined with AND; the `or` list is rendered as a single
//! disjunctive clause after every conjunctive predicate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HrOpsError, Result};

/// Comparison category of a [`Condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
    In,
    Contains,
    Is,
}

impl FilterOp {
    /// Order in which categories are applied to a query
    pub const APPLY_ORDER: [Self; 11] = [
        Self::Eq,
        Self::Neq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Like,
        Self::ILike,
        Self::In,
        Self::Contains,
        Self::Is,
    ];
}

/// Target of an `is` check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullCheck {
    Null,
    NotNull,
    True,
    False,
}

/// A single predicate on one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Condition {
    Eq { column: String, value: Value },
    Neq { column: String, value: Value },
    Gt { column: String, value: Value },
    Gte { column: String, value: Value },
    Lt { column: String, value: Value },
    Lte { column: String, value: Value },
    /// Case-sensitive pattern match (`%` and `_` wildcards)
    Like { column: String, pattern: String },
    /// Case-insensitive pattern match
    ILike { column: String, pattern: String },
    In { column: String, values: Vec<Value> },
    /// The array stored in `column` holds every one of `values`
    Contains { column: String, values: Vec<Value> },
    Is { column: String, check: NullCheck },
}

impl Condition {
    /// Column the predicate applies to
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. }
            | Self::Neq { column, .. }
            | Self::Gt { column, .. }
            | Self::Gte { column, .. }
            | Self::Lt { column, .. }
            | Self::Lte { column, .. }
            | Self::Like { column, .. }
            | Self::ILike { column, .. }
            | Self::In { column, .. }
            | Self::Contains { column, .. }
            | Self::Is { column, .. } => column,
        }
    }

    /// Category of the predicate
    #[must_use]
    pub const fn op(&self) -> FilterOp {
        match self {
            Self::Eq { .. } => FilterOp::Eq,
            Self::Neq { .. } => FilterOp::Neq,
            Self::Gt { .. } => FilterOp::Gt,
            Self::Gte { .. } => FilterOp::Gte,
            Self::Lt { .. } => FilterOp::Lt,
            Self::Lte { .. } => FilterOp::Lte,
            Self::Like { .. } => FilterOp::Like,
            Self::ILike { .. } => FilterOp::ILike,
            Self::In { .. } => FilterOp::In,
            Self::Contains { .. } => FilterOp::Contains,
            Self::Is { .. } => FilterOp::Is,
        }
    }
}

/// Filters grouped by comparison category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryFilters {
    pub eq: Vec<(String, Value)>,
    pub neq: Vec<(String, Value)>,
    pub gt: Vec<(String, Value)>,
    pub gte: Vec<(String, Value)>,
    pub lt: Vec<(String, Value)>,
    pub lte: Vec<(String, Value)>,
    pub like: Vec<(String, String)>,
    pub ilike: Vec<(String, String)>,
    #[serde(rename = "in")]
    pub in_list: Vec<(String, Vec<Value>)>,
    pub contains: Vec<(String, Vec<Value>)>,
    pub is: Vec<(String, NullCheck)>,
    /// Alternatives rendered as one `(a OR b ...)` clause
    pub or: Vec<Condition>,
}

impl QueryFilters {
    /// Empty filters (match everything)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a [`QueryFiltersBuilder`]
    #[must_use]
    pub fn builder() -> QueryFiltersBuilder {
        QueryFiltersBuilder::new()
    }

    /// True when no category holds a predicate
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conjunction_len() == 0 && self.or.is_empty()
    }

    fn conjunction_len(&self) -> usize {
        self.eq.len()
            + self.neq.len()
            + self.gt.len()
            + self.gte.len()
            + self.lt.len()
            + self.lte.len()
            + self.like.len()
            + self.ilike.len()
            + self.in_list.len()
            + self.contains.len()
            + self.is.len()
    }

    /// Conjunctive predicates in application order
    ///
    /// Categories follow [`FilterOp::APPLY_ORDER`]; pairs inside a category
    /// keep the order in which they were added. The `or` list is not included.
    #[must_use]
    pub fn conditions(&self) -> Vec<Condition> {
        let mut out = Vec::with_capacity(self.conjunction_len());
        for op in FilterOp::APPLY_ORDER {
            match op {
                FilterOp::Eq => out.extend(self.eq.iter().map(|(c, v)| Condition::Eq {
                    column: c.clone(),
                    value: v.clone(),
                })),
                FilterOp::Neq => out.extend(self.neq.iter().map(|(c, v)| Condition::Neq {
                    column: c.clone(),
                    value: v.clone(),
                })),
                FilterOp::Gt => out.extend(self.gt.iter().map(|(c, v)| Condition::Gt {
                    column: c.clone(),
                    value: v.clone(),
                })),
                FilterOp::Gte => out.extend(self.gte.iter().map(|(c, v)| Condition::Gte {
                    column: c.clone(),
                    value: v.clone(),
                })),
                FilterOp::Lt => out.extend(self.lt.iter().map(|(c, v)| Condition::Lt {
                    column: c.clone(),
                    value: v.clone(),
                })),
                FilterOp::Lte => out.extend(self.lte.iter().map(|(c, v)| Condition::Lte {
                    column: c.clone(),
                    value: v.clone(),
                })),
                FilterOp::Like => out.extend(self.like.iter().map(|(c, p)| Condition::Like {
                    column: c.clone(),
                    pattern: p.clone(),
                })),
                FilterOp::ILike => out.extend(self.ilike.iter().map(|(c, p)| Condition::ILike {
                    column: c.clone(),
                    pattern: p.clone(),
                })),
                FilterOp::In => out.extend(self.in_list.iter().map(|(c, v)| Condition::In {
                    column: c.clone(),
                    values: v.clone(),
                })),
                FilterOp::Contains => {
                    out.extend(self.contains.iter().map(|(c, v)| Condition::Contains {
                        column: c.clone(),
                        values: v.clone(),
                    }));
                }
                FilterOp::Is => out.extend(self.is.iter().map(|(c, check)| Condition::Is {
                    column: c.clone(),
                    check: *check,
                })),
            }
        }
        out
    }

    /// Append every predicate of `other` after the ones already present
    pub fn merge(&mut self, other: Self) {
        self.eq.extend(other.eq);
        self.neq.extend(other.neq);
        self.gt.extend(other.gt);
        self.gte.extend(other.gte);
        self.lt.extend(other.lt);
        self.lte.extend(other.lte);
        self.like.extend(other.like);
        self.ilike.extend(other.ilike);
        self.in_list.extend(other.in_list);
        self.contains.extend(other.contains);
        self.is.extend(other.is);
        self.or.extend(other.or);
    }
}

/// Builder for [`QueryFilters`]
#[derive(Debug, Clone, Default)]
pub struct QueryFiltersBuilder {
    filters: QueryFilters,
}

impl QueryFiltersBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = value`
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.eq.push((column.into(), value.into()));
        self
    }

    /// `column <> value`
    #[must_use]
    pub fn neq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.neq.push((column.into(), value.into()));
        self
    }

    /// `column > value`
    #[must_use]
    pub fn gt(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.gt.push((column.into(), value.into()));
        self
    }

    /// `column >= value`
    #[must_use]
    pub fn gte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.gte.push((column.into(), value.into()));
        self
    }

    /// `column < value`
    #[must_use]
    pub fn lt(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.lt.push((column.into(), value.into()));
        self
    }

    /// `column <= value`
    #[must_use]
    pub fn lte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.lte.push((column.into(), value.into()));
        self
    }

    /// Case-sensitive pattern match
    #[must_use]
    pub fn like(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters.like.push((column.into(), pattern.into()));
        self
    }

    /// Case-insensitive pattern match
    #[must_use]
    pub fn ilike(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters.ilike.push((column.into(), pattern.into()));
        self
    }

    /// Set membership
    #[must_use]
    pub fn in_list<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filters.in_list.push((
            column.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Array column contains all of `values`
    #[must_use]
    pub fn contains<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filters.contains.push((
            column.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// `column IS NULL` / `IS NOT NULL` / `IS TRUE` / `IS FALSE`
    #[must_use]
    pub fn is(mut self, column: impl Into<String>, check: NullCheck) -> Self {
        self.filters.is.push((column.into(), check));
        self
    }

    /// Add an alternative to the single `or` clause
    #[must_use]
    pub fn or(mut self, condition: Condition) -> Self {
        self.filters.or.push(condition);
        self
    }

    /// Build the final filters
    #[must_use]
    pub fn build(self) -> QueryFilters {
        self.filters
    }
}

/// Sort direction of an [`OrderBy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One ordering key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// How many rows a read must produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultMode {
    /// Any number of rows
    #[default]
    Many,
    /// Exactly one row; zero or several rows is an error
    Single,
    /// Zero or one row; zero yields `None`, several is an error
    MaybeSingle,
}

/// Inclusive row range `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub from: usize,
    pub to: usize,
}

impl Range {
    /// Number of rows the range covers
    #[must_use]
    pub const fn len(&self) -> usize {
        self.to - self.from + 1
    }

    /// Ranges always cover at least one row
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Non-filter shaping of a read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub mode: ResultMode,
    /// Column projection, e.g. `"id, task_title"`; `None` or `"*"` selects all
    pub columns: Option<String>,
}

impl QueryOptions {
    /// Default options (all rows, all columns, backend order)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an ordering key; the first one added is the primary key
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    /// Set limit
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set offset; only honoured together with a limit
    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Require exactly one row
    #[must_use]
    pub const fn single(mut self) -> Self {
        self.mode = ResultMode::Single;
        self
    }

    /// Allow zero or one row
    #[must_use]
    pub const fn maybe_single(mut self) -> Self {
        self.mode = ResultMode::MaybeSingle;
        self
    }

    /// Restrict the returned columns
    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Inclusive range implied by `limit` and `offset`
    ///
    /// Only defined when both are set, the limit is non-zero and the window
    /// fits in `usize`: `[offset, offset + limit - 1]`.
    #[must_use]
    pub fn range(&self) -> Option<Range> {
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) if limit > 0 => Some(Range {
                from: offset,
                to: offset.checked_add(limit - 1)?,
            }),
            _ => None,
        }
    }

    /// Reject a limit or offset SQLite cannot express
    ///
    /// # Errors
    ///
    /// Returns [`HrOpsError::Validation`] if either bound exceeds `i64::MAX`
    /// or the window end overflows
    pub fn validate(&self) -> Result<()> {
        let max = usize::try_from(i64::MAX).unwrap_or(usize::MAX);
        for (name, value) in [("limit", self.limit), ("offset", self.offset)] {
            if value.is_some_and(|v| v > max) {
                return Err(HrOpsError::validation(format!("{name} exceeds {max}")));
            }
        }
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) if limit > 0 && self.range().is_none() => Err(
                HrOpsError::validation(format!("Range {offset}+{limit} overflows")),
            ),
            _ => Ok(()),
        }
    }

    /// Projected column names, or `None` for every column
    #[must_use]
    pub fn projected_columns(&self) -> Option<Vec<String>> {
        let columns = self.columns.as_deref()?.trim();
        if columns.is_empty() || columns == "*" {
            return None;
        }
        let names: Vec<String> = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToString::to_string)
            .collect();
        if names.is_empty() || names.iter().any(|c| c == "*") {
            None
        } else {
            Some(names)
        }
    }
}
