//! SQL builders for scoped entity statements
//!
//! Identifiers are always quoted and values always bound, so filters built
//! from user input cannot inject SQL. Unknown columns are left for SQLite to
//! reject.

use hrops_common::{COMPANY_COLUMN, DEPARTMENT_COLUMN, ID_COLUMN, USER_COLUMN};
use serde_json::Value;

use crate::models::{Record, RecordId};
use crate::query::{Condition, NullCheck, QueryFilters, QueryOptions, ResultMode, SortDirection};
use crate::scope::ScopeClauses;

/// Rows fetched for single-row modes; two is enough to detect "more than one"
const SINGLE_FETCH_LIMIT: usize = 2;

/// SQL text plus its positional bind values
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub binds: Vec<Value>,
}

/// Quote an identifier for SQLite
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Rewrite a `LIKE` pattern (`%`, `_`) as a case-sensitive `GLOB` pattern
#[must_use]
pub fn like_to_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        match ch {
            '%' => out.push('*'),
            '_' => out.push('?'),
            '*' => out.push_str("[*]"),
            '?' => out.push_str("[?]"),
            '[' => out.push_str("[[]"),
            c => out.push(c),
        }
    }
    out
}

/// Render one condition, pushing its bind values
fn render_condition(condition: &Condition, binds: &mut Vec<Value>) -> String {
    let column = quote_ident(condition.column());
    let compare = |operator: &str, value: &Value, binds: &mut Vec<Value>| {
        binds.push(value.clone());
        format!("{column} {operator} ?")
    };
    match condition {
        Condition::Eq { value, .. } => compare("=", value, binds),
        Condition::Neq { value, .. } => compare("<>", value, binds),
        Condition::Gt { value, .. } => compare(">", value, binds),
        Condition::Gte { value, .. } => compare(">=", value, binds),
        Condition::Lt { value, .. } => compare("<", value, binds),
        Condition::Lte { value, .. } => compare("<=", value, binds),
        Condition::Like { pattern, .. } => {
            binds.push(Value::from(like_to_glob(pattern)));
            format!("{column} GLOB ?")
        }
        Condition::ILike { pattern, .. } => {
            binds.push(Value::from(pattern.as_str()));
            format!("LOWER({column}) LIKE LOWER(?)")
        }
        Condition::In { values, .. } => {
            if values.is_empty() {
                return "0 = 1".to_string();
            }
            binds.extend(values.iter().cloned());
            let placeholders = vec!["?"; values.len()].join(", ");
            format!("{column} IN ({placeholders})")
        }
        Condition::Contains { values, .. } => {
            if values.is_empty() {
                return "1 = 1".to_string();
            }
            binds.extend(values.iter().cloned());
            let parts: Vec<String> = values
                .iter()
                .map(|_| {
                    format!("EXISTS (SELECT 1 FROM json_each({column}) WHERE json_each.value = ?)")
                })
                .collect();
            if parts.len() == 1 {
                parts.concat()
            } else {
                format!("({})", parts.join(" AND "))
            }
        }
        Condition::Is { check, .. } => match check {
            NullCheck::Null => format!("{column} IS NULL"),
            NullCheck::NotNull => format!("{column} IS NOT NULL"),
            NullCheck::True => format!("{column} IS TRUE"),
            NullCheck::False => format!("{column} IS FALSE"),
        },
    }
}

/// Render the scoping predicates, pushing their bind values
fn render_scope(scope: &ScopeClauses, predicates: &mut Vec<String>, binds: &mut Vec<Value>) {
    if let Some(company_id) = scope.company_id {
        predicates.push(format!("{} = ?", quote_ident(COMPANY_COLUMN)));
        binds.push(Value::from(company_id));
    }
    if let Some(user_id) = scope.user_id {
        predicates.push(format!("{} = ?", quote_ident(USER_COLUMN)));
        binds.push(Value::from(user_id.to_string()));
    }
    if let Some(department_id) = scope.department_id {
        let column = quote_ident(DEPARTMENT_COLUMN);
        predicates.push(format!("({column} = ? OR {column} IS NULL)"));
        binds.push(Value::from(department_id));
    }
}

fn where_clause(predicates: &[String]) -> String {
    if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    }
}

fn column_list(columns: Option<&[String]>) -> String {
    columns.map_or_else(
        || "*".to_string(),
        |cols| {
            cols.iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ")
        },
    )
}

/// Builder for scoped `SELECT` statements
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    columns: Option<Vec<String>>,
    predicates: Vec<String>,
    binds: Vec<Value>,
    order: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl SelectBuilder {
    /// `SELECT * FROM table`
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: None,
            predicates: Vec::new(),
            binds: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Add the scoping predicates
    #[must_use]
    pub fn scope(mut self, scope: &ScopeClauses) -> Self {
        render_scope(scope, &mut self.predicates, &mut self.binds);
        self
    }

    /// Add the filter predicates; the `or` clause goes last
    #[must_use]
    pub fn filters(mut self, filters: &QueryFilters) -> Self {
        for condition in filters.conditions() {
            let predicate = render_condition(&condition, &mut self.binds);
            self.predicates.push(predicate);
        }
        if !filters.or.is_empty() {
            let alternatives: Vec<String> = filters
                .or
                .iter()
                .map(|c| render_condition(c, &mut self.binds))
                .collect();
            self.predicates
                .push(format!("({})", alternatives.join(" OR ")));
        }
        self
    }

    /// Apply ordering, limit/offset, projection and the result mode
    #[must_use]
    pub fn options(mut self, options: &QueryOptions) -> Self {
        for order in &options.order {
            let direction = match order.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            self.order
                .push(format!("{} {direction}", quote_ident(&order.column)));
        }
        self.columns = options.projected_columns();
        self.limit = options.limit;
        self.offset = options.range().map(|r| r.from);
        if options.mode != ResultMode::Many {
            self.limit = Some(
                self.limit
                    .map_or(SINGLE_FETCH_LIMIT, |l| l.min(SINGLE_FETCH_LIMIT)),
            );
        }
        self
    }

    /// Restrict to the row with `id`
    #[must_use]
    pub fn id(mut self, id: RecordId) -> Self {
        self.predicates.push(format!("{} = ?", quote_ident(ID_COLUMN)));
        self.binds.push(Value::from(id));
        self
    }

    /// Render the statement
    #[must_use]
    pub fn build(self) -> SqlStatement {
        let mut sql = format!(
            "SELECT {} FROM {}{}",
            column_list(self.columns.as_deref()),
            quote_ident(&self.table),
            where_clause(&self.predicates)
        );
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }
        SqlStatement {
            sql,
            binds: self.binds,
        }
    }
}

/// Builder for `INSERT ... RETURNING` statements
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<String>,
    binds: Vec<Value>,
    returning: Option<Vec<String>>,
}

impl InsertBuilder {
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            binds: Vec::new(),
            returning: None,
        }
    }

    /// Insert every key of `record`
    #[must_use]
    pub fn values(mut self, record: &Record) -> Self {
        for (column, value) in record {
            self.columns.push(column.clone());
            self.binds.push(value.clone());
        }
        self
    }

    /// Columns returned for the new row (default: all)
    #[must_use]
    pub fn returning(mut self, columns: Option<Vec<String>>) -> Self {
        self.returning = columns;
        self
    }

    #[must_use]
    pub fn build(self) -> SqlStatement {
        let returning = column_list(self.returning.as_deref());
        let sql = if self.columns.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING {returning}",
                quote_ident(&self.table)
            )
        } else {
            let columns: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
            let placeholders = vec!["?"; self.columns.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({placeholders}) RETURNING {returning}",
                quote_ident(&self.table),
                columns.join(", ")
            )
        };
        SqlStatement {
            sql,
            binds: self.binds,
        }
    }
}

/// Builder for partial `UPDATE ... WHERE id = ?` statements
///
/// Only the fields added are written; everything else keeps its value.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: String,
    updates: Vec<String>,
    binds: Vec<Value>,
}

impl UpdateBuilder {
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            updates: Vec::new(),
            binds: Vec::new(),
        }
    }

    /// Create a builder setting every key of `record`; `id` is never rewritten
    #[must_use]
    pub fn from_record(table: &str, record: &Record) -> Self {
        record
            .iter()
            .filter(|(column, _)| column.as_str() != ID_COLUMN)
            .fold(Self::new(table), |builder, (column, value)| {
                builder.add_field(column, value.clone())
            })
    }

    /// Add a field to the SET list
    #[must_use]
    pub fn add_field(mut self, field_name: &str, value: Value) -> Self {
        self.updates.push(format!("{} = ?", quote_ident(field_name)));
        self.binds.push(value);
        self
    }

    /// Check if any fields have been set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Get the number of fields being updated
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Get the field names being updated (for logging)
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        self.updates
            .iter()
            .map(|u| {
                u.split(" = ")
                    .next()
                    .unwrap_or("")
                    .trim_matches('"')
                    .to_string()
            })
            .collect()
    }

    /// Render the statement for row `id` within `guard`
    ///
    /// An empty SET list still renders a valid no-op assignment of `id`, so the
    /// caller gets the current row back.
    #[must_use]
    pub fn build(self, id: RecordId, guard: &ScopeClauses) -> SqlStatement {
        let mut binds = self.binds;
        let set = if self.updates.is_empty() {
            let id_column = quote_ident(ID_COLUMN);
            format!("{id_column} = {id_column}")
        } else {
            self.updates.join(", ")
        };

        let mut predicates = vec![format!("{} = ?", quote_ident(ID_COLUMN))];
        binds.push(Value::from(id));
        render_scope(guard, &mut predicates, &mut binds);

        SqlStatement {
            sql: format!(
                "UPDATE {} SET {set}{} RETURNING *",
                quote_ident(&self.table),
                where_clause(&predicates)
            ),
            binds,
        }
    }
}

/// Render `DELETE FROM table WHERE id = ? [AND scope] RETURNING id`
#[must_use]
pub fn delete_statement(table: &str, id: RecordId, guard: &ScopeClauses) -> SqlStatement {
    let mut predicates = vec![format!("{} = ?", quote_ident(ID_COLUMN))];
    let mut binds = vec![Value::from(id)];
    render_scope(guard, &mut predicates, &mut binds);
    SqlStatement {
        sql: format!(
            "DELETE FROM {}{} RETURNING {}",
            quote_ident(table),
            where_clause(&predicates),
            quote_ident(ID_COLUMN)
        ),
        binds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::to_record;
    use crate::query::QueryFilters;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("name"), "\"name\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_like_to_glob() {
        assert_eq!(like_to_glob("Rev%"), "Rev*");
        assert_eq!(like_to_glob("a_c"), "a?c");
        assert_eq!(like_to_glob("100*[x]?"), "100[*][[]x][?]");
    }

    #[test]
    fn test_plain_select() {
        let statement = SelectBuilder::new("tasks").build();
        assert_eq!(statement.sql, "SELECT * FROM \"tasks\"");
        assert!(statement.binds.is_empty());
    }

    #[test]
    fn test_scope_predicates() {
        let user = Uuid::new_v4();
        let scope = ScopeClauses {
            company_id: Some(42),
            user_id: Some(user),
            department_id: Some(3),
        };
        let statement = SelectBuilder::new("notices").scope(&scope).build();

        assert_eq!(
            statement.sql,
            "SELECT * FROM \"notices\" WHERE \"company_id\" = ? AND \"user_id\" = ? \
             AND (\"department_id\" = ? OR \"department_id\" IS NULL)"
        );
        assert_eq!(
            statement.binds,
            vec![json!(42), json!(user.to_string()), json!(3)]
        );
    }

    #[test]
    fn test_filters_render_in_category_order_with_or_last() {
        let filters = QueryFilters::builder()
            .or(Condition::Eq {
                column: "priority".into(),
                value: json!("high"),
            })
            .or(Condition::Is {
                column: "priority".into(),
                check: NullCheck::Null,
            })
            .ilike("task_title", "%pr%")
            .eq("status", false)
            .build();

        let statement = SelectBuilder::new("tasks")
            .scope(&ScopeClauses {
                company_id: Some(1),
                ..Default::default()
            })
            .filters(&filters)
            .build();

        assert_eq!(
            statement.sql,
            "SELECT * FROM \"tasks\" WHERE \"company_id\" = ? AND \"status\" = ? \
             AND LOWER(\"task_title\") LIKE LOWER(?) \
             AND (\"priority\" = ? OR \"priority\" IS NULL)"
        );
        assert_eq!(
            statement.binds,
            vec![json!(1), json!(false), json!("%pr%"), json!("high")]
        );
    }

    #[test]
    fn test_in_and_contains() {
        let filters = QueryFilters::builder()
            .in_list("id", [1, 2, 3])
            .contains("assignees", ["u1", "u2"])
            .build();
        let statement = SelectBuilder::new("tasks").filters(&filters).build();

        assert!(statement.sql.contains("\"id\" IN (?, ?, ?)"));
        assert!(statement.sql.contains(
            "(EXISTS (SELECT 1 FROM json_each(\"assignees\") WHERE json_each.value = ?) AND \
             EXISTS (SELECT 1 FROM json_each(\"assignees\") WHERE json_each.value = ?))"
        ));
        assert_eq!(statement.binds.len(), 5);
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let filters = QueryFilters::builder()
            .in_list::<i64>("id", Vec::new())
            .build();
        let statement = SelectBuilder::new("tasks").filters(&filters).build();
        assert!(statement.sql.ends_with("WHERE 0 = 1"));
    }

    #[test]
    fn test_like_uses_glob() {
        let filters = QueryFilters::builder().like("name", "Ac_e%").build();
        let statement = SelectBuilder::new("stakeholders").filters(&filters).build();
        assert!(statement.sql.contains("\"name\" GLOB ?"));
        assert_eq!(statement.binds, vec![json!("Ac?e*")]);
    }

    #[test]
    fn test_options_order_range_and_projection() {
        let options = QueryOptions::new()
            .order_by("created_at", SortDirection::Desc)
            .order_by("id", SortDirection::Asc)
            .limit(10)
            .offset(30)
            .select("id, task_title");
        let statement = SelectBuilder::new("tasks").options(&options).build();

        assert_eq!(
            statement.sql,
            "SELECT \"id\", \"task_title\" FROM \"tasks\" \
             ORDER BY \"created_at\" DESC, \"id\" ASC LIMIT 10 OFFSET 30"
        );
    }

    #[test]
    fn test_offset_without_limit_is_ignored() {
        let statement = SelectBuilder::new("tasks")
            .options(&QueryOptions::new().offset(5))
            .build();
        assert_eq!(statement.sql, "SELECT * FROM \"tasks\"");
    }

    #[test]
    fn test_single_modes_fetch_two_rows() {
        let single = SelectBuilder::new("tasks")
            .options(&QueryOptions::new().single())
            .build();
        assert!(single.sql.ends_with("LIMIT 2"));

        let limited = SelectBuilder::new("tasks")
            .options(&QueryOptions::new().maybe_single().limit(1))
            .build();
        assert!(limited.sql.ends_with("LIMIT 1"));
    }

    #[test]
    fn test_select_by_id() {
        let statement = SelectBuilder::new("tasks").id(9).build();
        assert_eq!(statement.sql, "SELECT * FROM \"tasks\" WHERE \"id\" = ?");
        assert_eq!(statement.binds, vec![json!(9)]);
    }

    #[test]
    fn test_insert_statement() {
        let record = to_record(&json!({"task_title": "Review PR", "company_id": 42})).unwrap();
        let statement = InsertBuilder::new("tasks").values(&record).build();

        assert_eq!(
            statement.sql,
            "INSERT INTO \"tasks\" (\"company_id\", \"task_title\") VALUES (?, ?) RETURNING *"
        );
        assert_eq!(statement.binds, vec![json!(42), json!("Review PR")]);
    }

    #[test]
    fn test_insert_default_values() {
        let statement = InsertBuilder::new("grades")
            .returning(Some(vec!["id".to_string()]))
            .build();
        assert_eq!(
            statement.sql,
            "INSERT INTO \"grades\" DEFAULT VALUES RETURNING \"id\""
        );
    }

    #[test]
    fn test_update_builder_from_record() {
        let record = to_record(&json!({"id": 5, "status": true, "task_title": "Done"})).unwrap();
        let builder = UpdateBuilder::from_record("tasks", &record);

        assert_eq!(builder.len(), 2);
        assert_eq!(builder.fields(), vec!["status", "task_title"]);

        let statement = builder.build(
            5,
            &ScopeClauses {
                company_id: Some(42),
                ..Default::default()
            },
        );
        assert_eq!(
            statement.sql,
            "UPDATE \"tasks\" SET \"status\" = ?, \"task_title\" = ? \
             WHERE \"id\" = ? AND \"company_id\" = ? RETURNING *"
        );
        assert_eq!(
            statement.binds,
            vec![json!(true), json!("Done"), json!(5), json!(42)]
        );
    }

    #[test]
    fn test_empty_update_is_noop_assignment() {
        let builder = UpdateBuilder::new("tasks");
        assert!(builder.is_empty());
        let statement = builder.build(1, &ScopeClauses::none());
        assert_eq!(
            statement.sql,
            "UPDATE \"tasks\" SET \"id\" = \"id\" WHERE \"id\" = ? RETURNING *"
        );
    }

    #[test]
    fn test_delete_statement_with_tenant_guard() {
        let statement = delete_statement(
            "tasks",
            3,
            &ScopeClauses {
                company_id: Some(42),
                ..Default::default()
            },
        );
        assert_eq!(
            statement.sql,
            "DELETE FROM \"tasks\" WHERE \"id\" = ? AND \"company_id\" = ? RETURNING \"id\""
        );
        assert_eq!(statement.binds, vec![json!(3), json!(42)]);
    }
}
