use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema;
use crate::table::RawTable;

/// One cleaned row keyed by the canonical schema, ready for persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    pub title: String,
    pub salary: f64,
    pub currency: String,
    pub country: String,
    pub seniority: String,
    pub stack: String,
}

/// Apply the schema catalog's cleaning rules to a mapped table.
///
/// - `salary` is coerced to a number; rows where coercion fails are dropped
///   entirely (the only row-removing rule). A table without a salary column
///   drops every row.
/// - `title`, `country`, `seniority`, `stack`: missing cells become "",
///   values are trimmed.
/// - `currency`: trimmed; missing or empty becomes "USD".
/// - Columns outside the canonical schema are ignored.
///
/// Pure function of the table contents; row order is preserved for sampling.
/// Normalizing already-normalized data is a fixed point.
pub fn normalize(table: &RawTable) -> Vec<JobRecord> {
    let salary_idx = table.column_index(schema::SALARY_FIELD);
    let title_idx = table.column_index("title");
    let currency_idx = table.column_index(schema::CURRENCY_FIELD);
    let country_idx = table.column_index("country");
    let seniority_idx = table.column_index("seniority");
    let stack_idx = table.column_index("stack");

    let mut records = Vec::with_capacity(table.row_count());
    let mut dropped = 0usize;

    for row in &table.rows {
        let text = |idx: Option<usize>| -> String {
            idx.map(|i| table.cell(row, i).trim().to_string())
                .unwrap_or_default()
        };

        let salary_cell = text(salary_idx);
        let salary = match salary_cell.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                dropped += 1;
                continue;
            }
        };

        let currency = {
            let c = text(currency_idx);
            if c.is_empty() {
                schema::DEFAULT_CURRENCY.to_string()
            } else {
                c
            }
        };

        records.push(JobRecord {
            title: text(title_idx),
            salary,
            currency,
            country: text(country_idx),
            seniority: text(seniority_idx),
            stack: text(stack_idx),
        });
    }

    if dropped > 0 {
        debug!("dropped {} rows with non-numeric salary", dropped);
        counter!("ingest_rows_dropped_total").increment(dropped as u64);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn non_numeric_salary_drops_the_whole_row() {
        let t = table(
            &["title", "salary"],
            &[&["Dev", "15000"], &["Ops", "xpto"], &["QA", "12000.50"]],
        );
        let records = normalize(&t);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].salary, 15000.0);
        assert_eq!(records[1].title, "QA");
        assert_eq!(records[1].salary, 12000.5);
    }

    #[test]
    fn missing_salary_column_drops_every_row() {
        let t = table(&["title"], &[&["Dev"], &["Ops"]]);
        assert!(normalize(&t).is_empty());
    }

    #[test]
    fn text_fields_are_trimmed_and_defaulted() {
        let t = table(
            &["title", "salary", "country", "seniority", "stack"],
            &[&[" Sr Dev ", "100", " BR ", "Senior", " Python "]],
        );
        let records = normalize(&t);
        assert_eq!(records[0].title, "Sr Dev");
        assert_eq!(records[0].country, "BR");
        assert_eq!(records[0].stack, "Python");
        // currency column absent entirely
        assert_eq!(records[0].currency, "USD");
    }

    #[test]
    fn empty_currency_defaults_to_usd_and_others_pass_through() {
        let t = table(
            &["salary", "currency"],
            &[&["1", ""], &["2", "  "], &["3", "EUR"]],
        );
        let records = normalize(&t);
        assert_eq!(records[0].currency, "USD");
        assert_eq!(records[1].currency, "USD");
        assert_eq!(records[2].currency, "EUR");
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let t = table(
            &["salary", "bonus", "title"],
            &[&["100", "999", "Dev"]],
        );
        let records = normalize(&t);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Dev");
    }

    #[test]
    fn normalization_is_a_fixed_point() {
        let t = table(
            &["title", "salary", "currency", "country", "seniority", "stack"],
            &[&[" Dev ", " 15000 ", "", "BR", "Senior", "Go"]],
        );
        let once = normalize(&t);

        // Render the normalized records back into a table and re-run.
        let rendered = RawTable {
            columns: crate::schema::CANONICAL_FIELDS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows: once
                .iter()
                .map(|r| {
                    vec![
                        r.title.clone(),
                        r.salary.to_string(),
                        r.currency.clone(),
                        r.country.clone(),
                        r.seniority.clone(),
                        r.stack.clone(),
                    ]
                })
                .collect(),
        };
        let twice = normalize(&rendered);
        assert_eq!(once, twice);
    }
}
