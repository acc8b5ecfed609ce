use super::error::FilterError;
use super::types::{BindValue, WhereEq, WhereIn};

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterWhereOptions {
    /// Skip the implicit `deleted_at IS NULL` guard
    pub include_deleted: bool,
}

/// Renders conjunctive predicates into a WHERE body with positional params.
///
/// Each predicate fragment is a code-defined string holding exactly one `?`.
/// Equality fragments get one `$n`; inclusion fragments get one `$n` per
/// bound value. Nothing from the bound values is ever spliced into the text.
pub struct FilterWhere {
    param_values: Vec<BindValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(
        table_name: &str,
        where_eq: &[WhereEq],
        where_in: &[WhereIn],
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<BindValue>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(table_name, where_eq, where_in, options)
    }

    pub fn generate_empty(table_name: &str, options: &FilterWhereOptions) -> (String, Vec<BindValue>) {
        let where_clause = if options.include_deleted {
            "1=1".to_string()
        } else {
            format!("{}.deleted_at IS NULL", table_name)
        };
        (where_clause, vec![])
    }

    pub fn validate(fragment: &str) -> Result<(), FilterError> {
        match fragment.matches('?').count() {
            1 => Ok(()),
            n => Err(FilterError::InvalidWhereClause(format!(
                "predicate '{}' must hold exactly one placeholder, found {}",
                fragment, n
            ))),
        }
    }

    fn build(
        &mut self,
        table_name: &str,
        where_eq: &[WhereEq],
        where_in: &[WhereIn],
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<BindValue>), FilterError> {
        let mut sql_conditions = vec![];
        if !options.include_deleted {
            sql_conditions.push(format!("{}.deleted_at IS NULL", table_name));
        }

        for condition in where_eq {
            Self::validate(condition.fragment)?;
            let placeholder = self.param(condition.value.clone());
            sql_conditions.push(condition.fragment.replacen('?', &placeholder, 1));
        }

        for condition in where_in {
            Self::validate(condition.fragment)?;
            if condition.values.is_empty() {
                sql_conditions.push("1=0".to_string());
                continue;
            }
            let placeholders: Vec<String> = condition
                .values
                .iter()
                .map(|v| self.param(v.clone()))
                .collect();
            sql_conditions.push(condition.fragment.replacen('?', &placeholders.join(", "), 1));
        }

        let where_clause = if sql_conditions.is_empty() {
            "1=1".to_string()
        } else {
            sql_conditions.join(" AND ")
        };
        Ok((where_clause, std::mem::take(&mut self.param_values)))
    }

    fn param(&mut self, value: BindValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}
