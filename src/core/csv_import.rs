//! Expense CSV ingestion.
//!
//! Parses a small bank/expense export into validated records before they
//! touch the store. Import is all-or-nothing: any invalid row voids the
//! whole batch and the caller gets every row error back at once.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// One validated expense row, in file order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvRecord {
    pub date: NaiveDate,
    pub name: String,
    pub amount: Decimal,
    pub description: String,
}

/// Parses `date,name,amount,description` rows below a header line.
///
/// Row numbers in error messages are 1-based file line numbers, so the
/// first data row is row 2. A failing row is excluded and reported but
/// does not stop validation of the rows after it.
pub fn parse_expense_csv(input: &str) -> Result<Vec<CsvRecord>, Vec<String>> {
    let lines: Vec<&str> = input.lines().collect();
    if lines.len() < 2 {
        return Err(vec![
            "file must contain a header line and at least one data row".to_string(),
        ]);
    }

    let mut records = Vec::new();
    let mut errors = Vec::new();

    // Skip the header; description may itself contain commas, so the row
    // is split into at most four fields.
    for (idx, line) in lines.iter().enumerate().skip(1) {
        let row = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.splitn(4, ',');
        let date_field = fields.next().unwrap_or("").trim();
        let name_field = fields.next().unwrap_or("").trim();
        let amount_field = fields.next().unwrap_or("").trim();
        let description = fields.next().unwrap_or("").trim().to_string();

        let mut valid = true;

        let date = match NaiveDate::parse_from_str(date_field, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                errors.push(format!("row {row}: invalid date '{date_field}'"));
                valid = false;
                None
            }
        };

        if name_field.is_empty() {
            errors.push(format!("row {row}: name is required"));
            valid = false;
        }

        let amount = match amount_field.parse::<Decimal>() {
            Ok(a) if a > Decimal::ZERO => Some(a),
            Ok(_) => {
                errors.push(format!("row {row}: amount must be greater than zero"));
                valid = false;
                None
            }
            Err(_) => {
                errors.push(format!("row {row}: invalid amount '{amount_field}'"));
                valid = false;
                None
            }
        };

        if valid {
            records.push(CsvRecord {
                // Both are Some when no error was recorded for the row.
                date: date.unwrap_or_default(),
                name: name_field.to_string(),
                amount: amount.unwrap_or_default(),
                description,
            });
        }
    }

    if errors.is_empty() {
        Ok(records)
    } else {
        Err(errors)
    }
}
