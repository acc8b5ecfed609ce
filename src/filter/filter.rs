use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::{FilterWhere, FilterWhereOptions};
use super::types::{BindValue, Changeset, Join, OrderBy, QueryDescriptor, SqlResult, WhereEq, WhereIn};

/// Renders a `QueryDescriptor` into parameterized SQL for one table.
///
/// Identifiers (table, columns, sort key) are validated against a strict
/// character set; predicate text comes from code-defined fragments and only
/// bound values come from the caller's input.
pub struct Filter {
    table_name: String,
    select_columns: Vec<&'static str>,
    distinct: bool,
    joins: Vec<Join>,
    where_eq: Vec<WhereEq>,
    where_in: Vec<WhereIn>,
    order: Option<OrderBy>,
    limit: Option<i64>,
    offset: Option<i64>,
    options: FilterWhereOptions,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            distinct: false,
            joins: vec![],
            where_eq: vec![],
            where_in: vec![],
            order: None,
            limit: None,
            offset: None,
            options: FilterWhereOptions::default(),
        })
    }

    pub fn assign(&mut self, data: &QueryDescriptor) -> Result<&mut Self, FilterError> {
        self.select(&data.select)?;
        self.distinct = data.distinct;
        self.joins = data.joins.clone();
        for w in &data.where_eq {
            FilterWhere::validate(w.fragment)?;
        }
        for w in &data.where_in {
            FilterWhere::validate(w.fragment)?;
        }
        self.where_eq = data.where_eq.clone();
        self.where_in = data.where_in.clone();
        if let Some(order) = &data.order_by {
            FilterOrder::validate(order)?;
            self.order = Some(order.clone());
        }
        if let Some(limit) = data.limit {
            self.limit(limit, data.offset)?;
        }
        self.options.include_deleted = data.include_deleted;
        Ok(self)
    }

    pub fn select(&mut self, columns: &[&'static str]) -> Result<&mut Self, FilterError> {
        Self::validate_select_columns(columns)?;
        self.select_columns = columns.to_vec();
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidWindow(format!("limit {}", limit)));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidWindow(format!("offset {}", off)));
            }
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = self.where_parts(0)?;
        let order_clause = FilterOrder::generate(&self.table_name, self.order.as_ref())?;

        let query = [
            self.build_select_from(),
            format!("WHERE {}", where_clause),
            order_clause,
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    /// Counts the rows `to_sql` would return before LIMIT/OFFSET apply.
    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = self.where_parts(0)?;
        let query = format!(
            "SELECT COUNT(*) AS count FROM ({} WHERE {}) AS sub",
            self.build_select_from(),
            where_clause
        );
        Ok(SqlResult { query, params })
    }

    /// `UPDATE ... SET ... WHERE ...`; `updated_at` is always refreshed.
    pub fn to_update_sql(&self, changes: &Changeset) -> Result<SqlResult, FilterError> {
        if changes.is_empty() {
            return Err(FilterError::EmptyChangeset(self.table_name.clone()));
        }
        self.ensure_no_joins()?;

        let mut params = Vec::with_capacity(changes.len());
        let mut assignments = Vec::with_capacity(changes.len() + 1);
        for (column, value) in changes.entries() {
            Self::validate_column(column)?;
            params.push(value.clone());
            assignments.push(format!("{} = ${}", column, params.len()));
        }
        if !changes.contains("updated_at") {
            assignments.push("updated_at = NOW()".to_string());
        }

        let (where_clause, where_params) = self.where_parts(params.len())?;
        params.extend(where_params);

        let query = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table_name,
            assignments.join(", "),
            where_clause
        );
        Ok(SqlResult { query, params })
    }

    /// Marks matching live rows as deleted without removing them.
    pub fn to_soft_delete_sql(&self) -> Result<SqlResult, FilterError> {
        self.ensure_no_joins()?;
        let (where_clause, params) = self.where_parts(0)?;
        let query = format!(
            "UPDATE {} SET deleted_at = NOW() WHERE {}",
            self.table_name, where_clause
        );
        Ok(SqlResult { query, params })
    }

    /// Physical delete, used for rows that carry no identity of their own.
    pub fn to_delete_sql(&self) -> Result<SqlResult, FilterError> {
        self.ensure_no_joins()?;
        let (where_clause, params) = self.where_parts(0)?;
        let query = format!("DELETE FROM {} WHERE {}", self.table_name, where_clause);
        Ok(SqlResult { query, params })
    }

    /// Single-row insert returning the generated id.
    pub fn to_insert_sql(&self, values: &Changeset) -> Result<SqlResult, FilterError> {
        let mut result = self.to_insert_many_sql(std::slice::from_ref(values))?;
        result.query.push_str(" RETURNING id");
        Ok(result)
    }

    /// Multi-row insert. Every row must assign the same columns in the same order.
    pub fn to_insert_many_sql(&self, rows: &[Changeset]) -> Result<SqlResult, FilterError> {
        let first = rows
            .first()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| FilterError::EmptyChangeset(self.table_name.clone()))?;
        let columns: Vec<&'static str> = first.columns().collect();
        for column in &columns {
            Self::validate_column(column)?;
        }

        let mut params: Vec<BindValue> = Vec::with_capacity(rows.len() * columns.len());
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            if !row.columns().eq(columns.iter().copied()) {
                return Err(FilterError::InvalidColumn(format!(
                    "Inconsistent insert columns for {}",
                    self.table_name
                )));
            }
            let placeholders: Vec<String> = row
                .entries()
                .iter()
                .map(|(_, value)| {
                    params.push(value.clone());
                    format!("${}", params.len())
                })
                .collect();
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        let query = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table_name,
            columns.join(", "),
            tuples.join(", ")
        );
        Ok(SqlResult { query, params })
    }

    pub(crate) fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
            && !name.ends_with('.')
            && !name.contains("..")
    }

    fn where_parts(&self, starting_param_index: usize) -> Result<(String, Vec<BindValue>), FilterError> {
        if self.where_eq.is_empty() && self.where_in.is_empty() {
            return Ok(FilterWhere::generate_empty(&self.table_name, &self.options));
        }
        FilterWhere::generate(
            &self.table_name,
            &self.where_eq,
            &self.where_in,
            starting_param_index,
            &self.options,
        )
    }

    fn ensure_no_joins(&self) -> Result<(), FilterError> {
        if self.joins.is_empty() {
            Ok(())
        } else {
            Err(FilterError::JoinOnWrite(self.table_name.clone()))
        }
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() {
            return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string()));
        }
        if !Self::is_identifier(name) || name.contains('.') {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        if column.is_empty() {
            return Err(FilterError::InvalidColumn("Column name cannot be empty".to_string()));
        }
        if !Self::is_identifier(column) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
        }
        Ok(())
    }

    fn validate_select_columns(columns: &[&str]) -> Result<(), FilterError> {
        for column in columns {
            if *column == "*" {
                continue;
            }
            Self::validate_column(column)?;
        }
        Ok(())
    }

    fn build_select_from(&self) -> String {
        let columns = if self.select_columns.is_empty() || self.select_columns.contains(&"*") {
            format!("{}.*", self.table_name)
        } else {
            self.select_columns
                .iter()
                .map(|c| {
                    if c.contains('.') {
                        c.to_string()
                    } else {
                        format!("{}.{}", self.table_name, c)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut parts = vec![
            format!(
                "SELECT {}{}",
                if self.distinct { "DISTINCT " } else { "" },
                columns
            ),
            format!("FROM {}", self.table_name),
        ];
        parts.extend(self.joins.iter().map(|j| j.to_sql().to_string()));
        parts.join(" ")
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}
