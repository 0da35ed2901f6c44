// Copyright 2019-2022 Clemens Lutz
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Serializes tables in the same delimited format that the reader accepts.
//!
//! String fields are written in double quotes and numeric fields without.
//! Joined tables skip their sentinel rows.

use crate::error::{csv_error, io_error, Result};
use crate::tables::{CsvRow, Table};
use csv::{QuoteStyle, WriterBuilder};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Writes the header and all serializable rows of `table` into `writer`.
///
/// Returns the number of data rows written.
pub fn write_table<T, W>(table: &Table<T>, writer: W, sink: &str) -> Result<usize>
where
    T: CsvRow,
    W: Write,
{
    // Fields are quoted by `CsvRow`, the CSV writer must leave them as is.
    let mut csv = WriterBuilder::new()
        .delimiter(b',')
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);

    csv.write_record(T::header())
        .map_err(|e| csv_error(sink, e))?;

    let mut written = 0;
    for fields in table.iter().filter_map(|row| row.csv_fields()) {
        csv.write_record(&fields).map_err(|e| csv_error(sink, e))?;
        written += 1;
    }

    csv.flush().map_err(|e| io_error(sink, e))?;

    Ok(written)
}

/// Writes `table` to a file, creating missing parent directories.
pub fn write_table_to_path<T, P>(table: &Table<T>, path: P) -> Result<usize>
where
    T: CsvRow,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let sink = path.display().to_string();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent.display(), e))?;
        }
    }

    let file = File::create(path).map_err(|e| io_error(&sink, e))?;
    let written = write_table(table, BufWriter::new(file), &sink)?;
    info!(path = %sink, rows = written, "Wrote table");

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::write_table;
    use crate::tables::{
        ActiveFlag, CustomerRow, CustomerTable, JoinedRow, JoinedTable, PurchaseRow,
    };
    use std::error::Error;

    fn example_rows() -> Result<(CustomerRow, PurchaseRow), Box<dyn Error>> {
        let customer = CustomerRow::new(2, "Mary", ActiveFlag::Active)?;
        let purchase = PurchaseRow::new(100, 2, "1111111111111", 3)?;
        Ok((customer, purchase))
    }

    #[test]
    fn joined_row_format() -> Result<(), Box<dyn Error>> {
        let (customer, purchase) = example_rows()?;
        let table = JoinedTable::from_rows(vec![JoinedRow::matched(&purchase, &customer)]);

        let mut out = Vec::new();
        let written = write_table(&table, &mut out, "memory")?;

        assert_eq!(written, 1);
        assert_eq!(
            String::from_utf8(out)?,
            "timestamp,customer_id,customer_name,product_code,quantity\n\
             100,2,\"Mary\",\"1111111111111\",3\n"
        );

        Ok(())
    }

    #[test]
    fn sentinels_are_omitted() -> Result<(), Box<dyn Error>> {
        let (customer, purchase) = example_rows()?;
        let table = JoinedTable::from_rows(vec![
            JoinedRow::sentinel(),
            JoinedRow::matched(&purchase, &customer),
            JoinedRow::sentinel(),
        ]);

        let mut out = Vec::new();
        let written = write_table(&table, &mut out, "memory")?;
        let text = String::from_utf8(out)?;

        assert_eq!(written, 1);
        assert_eq!(text.lines().count(), 2);

        Ok(())
    }

    #[test]
    fn all_sentinels_yield_header_only() -> Result<(), Box<dyn Error>> {
        let table = JoinedTable::with_len(4)?;

        let mut out = Vec::new();
        let written = write_table(&table, &mut out, "memory")?;

        assert_eq!(written, 0);
        assert_eq!(
            String::from_utf8(out)?,
            "timestamp,customer_id,customer_name,product_code,quantity\n"
        );

        Ok(())
    }

    #[test]
    fn customers_round_trip_through_reader() -> Result<(), Box<dyn Error>> {
        let table = CustomerTable::from_rows(vec![
            CustomerRow::new(1, "James", ActiveFlag::Inactive)?,
            CustomerRow::new(2, "Mary", ActiveFlag::Active)?,
        ]);

        let mut out = Vec::new();
        write_table(&table, &mut out, "memory")?;

        let rows = crate::table_reader::TableReader::default()
            .customers_from_reader(out.as_slice(), "memory")
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(rows.as_slice(), table.as_slice());

        Ok(())
    }
}
