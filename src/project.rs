//! Output projection: one output column per mapping, over the filtered rows.

use chrono::{Datelike, Duration, NaiveDate};
use log::debug;

use crate::{
    data::{Value, normalize_header_key},
    expr::evaluate_sum,
    mapping::{ColumnMapping, MappingMode, MappingProfile, is_accounting_column},
    table::Table,
};

/// Fixed values replaced by the last day of the previous month.
pub const PREVIOUS_MONTH_END_TOKENS: [&str; 2] = ["last_day_of_last_month", "last_day_prev_month"];

/// Normalized header names recognised as an exchange-rate column.
pub const EXCHANGE_RATE_ALIASES: [&str; 5] = ["exchangerate", "tygia", "tigia", "tỷgiá", "tỷgia"];

pub fn last_day_of_previous_month(today: NaiveDate) -> NaiveDate {
    let first_of_month = today.with_day(1).unwrap_or(today);
    first_of_month - Duration::days(1)
}

/// Builds the output table for `profile`, evaluated as of `today`.
pub fn project(table: &Table, profile: &MappingProfile, today: NaiveDate) -> Table {
    let headers = profile
        .mappings()
        .iter()
        .map(|m| m.out_name.clone())
        .collect::<Vec<_>>();
    let columns = profile
        .mappings()
        .iter()
        .map(|mapping| {
            let column = project_column(table, mapping, today);
            if is_accounting_column(&mapping.out_name) {
                coerce_numeric(column)
            } else {
                column
            }
        })
        .collect();
    debug!(
        "Projected {} row(s) into {} output column(s)",
        table.len(),
        headers.len()
    );
    Table::from_columns(headers, columns, table.len())
}

fn project_column(table: &Table, mapping: &ColumnMapping, today: NaiveDate) -> Vec<Value> {
    match mapping.mode {
        MappingMode::SelectInput => copy_input(table, &mapping.input_col),
        MappingMode::Fixed => vec![fixed_value(&mapping.fixed_value, today); table.len()],
        MappingMode::Calculate => evaluate_sum(table, &mapping.formula),
        MappingMode::CurrencyRule => classify_currency(table),
    }
}

fn copy_input(table: &Table, input_col: &str) -> Vec<Value> {
    if input_col.is_empty() {
        return vec![Value::Empty; table.len()];
    }
    match table.column(input_col) {
        Some(values) => values.into_iter().cloned().collect(),
        None => {
            debug!("Input column '{input_col}' is not in the table; output left blank");
            vec![Value::Empty; table.len()]
        }
    }
}

/// The literal as text, or the previous month's last day for the date token.
pub fn fixed_value(raw: &str, today: NaiveDate) -> Value {
    let token = raw.trim().to_lowercase();
    if PREVIOUS_MONTH_END_TOKENS.contains(&token.as_str()) {
        Value::Text(
            last_day_of_previous_month(today)
                .format("%Y-%m-%d")
                .to_string(),
        )
    } else {
        Value::Text(raw.to_string())
    }
}

/// `VND` where the exchange-rate column is exactly 1, `USD` elsewhere.
pub fn classify_currency(table: &Table) -> Vec<Value> {
    let rate_column = table
        .headers()
        .iter()
        .position(|header| EXCHANGE_RATE_ALIASES.contains(&normalize_header_key(header).as_str()));
    let Some(idx) = rate_column else {
        debug!("No exchange-rate column found; currency left blank");
        return vec![Value::Empty; table.len()];
    };
    table
        .column_at(idx)
        .into_iter()
        .map(|rate| {
            let code = if rate.to_number_or_zero() == 1.0 { "VND" } else { "USD" };
            Value::Text(code.to_string())
        })
        .collect()
}

fn coerce_numeric(column: Vec<Value>) -> Vec<Value> {
    column
        .into_iter()
        .map(|value| value.to_number().map(Value::Number).unwrap_or(Value::Empty))
        .collect()
}
