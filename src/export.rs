//! Exporting the displayed transactions as CSV.

use std::io::Write;

use serde::Serialize;

use crate::{Error, EnrichedTransaction};

#[derive(Serialize)]
struct ExportRow<'a> {
    date: String,
    name: &'a str,
    category: &'a str,
    amount: String,
}

/// Write `transactions` to `writer` as CSV with a header row.
///
/// Rows are written in the given order, so pass the displayed (filtered and
/// sorted) list to export what the user sees. Amounts are written with two
/// decimal places and no currency symbol.
///
/// # Errors
/// Returns [Error::CsvError] if a row cannot be written.
pub fn write_csv<W: Write>(writer: W, transactions: &[EnrichedTransaction]) -> Result<(), Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for transaction in transactions {
        csv_writer.serialize(ExportRow {
            date: transaction.transaction.date.to_string(),
            name: &transaction.transaction.name,
            category: &transaction.category_name,
            amount: format!("{:.2}", transaction.transaction.amount),
        })?;
    }

    csv_writer.flush().map_err(|error| Error::CsvError(error.to_string()))?;
    tracing::debug!("Exported {} transactions as CSV", transactions.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        test_utils::{category, transaction},
        transaction::enrich,
    };

    use super::write_csv;

    #[test]
    fn writes_header_and_rows_in_order() {
        let transactions = enrich(
            vec![
                transaction(2, "Lunch, with friends", 12.5, date!(2024 - 03 - 03), Some(1)),
                transaction(1, "Bus", 3.0, date!(2024 - 03 - 02), None),
            ],
            &[category(1, "Food")],
        );
        let mut buffer = Vec::new();

        write_csv(&mut buffer, &transactions).expect("Could not write CSV");

        let got = String::from_utf8(buffer).unwrap();
        assert_eq!(
            got,
            "date,name,category,amount\n\
             2024-03-03,\"Lunch, with friends\",Food,12.50\n\
             2024-03-02,Bus,Other,3.00\n"
        );
    }

    #[test]
    fn empty_list_writes_nothing() {
        let mut buffer = Vec::new();

        write_csv(&mut buffer, &[]).expect("Could not write CSV");

        assert!(buffer.is_empty());
    }
}
