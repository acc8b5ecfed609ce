use super::error::FilterError;
use super::types::OrderBy;

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate(order: &OrderBy) -> Result<(), FilterError> {
        if crate::filter::Filter::is_identifier(order.column) {
            Ok(())
        } else {
            Err(FilterError::InvalidColumn(format!("Invalid order column: {}", order.column)))
        }
    }

    pub fn generate(table_name: &str, order: Option<&OrderBy>) -> Result<String, FilterError> {
        let Some(order) = order else { return Ok(String::new()) };
        Self::validate(order)?;
        let column = if order.column.contains('.') {
            order.column.to_string()
        } else {
            format!("{}.{}", table_name, order.column)
        };
        Ok(format!("ORDER BY {} {}", column, order.direction.to_sql()))
    }
}
