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

//! Loads the customer and purchases tables from delimited text files.
//!
//! Both files start with a header row, which is skipped. String fields may
//! be enclosed in double quotes. Files ending in `gz` are decompressed on the
//! fly.
//!
//! Every numeric field is parsed explicitly. A field that fails to parse
//! aborts loading with a `MalformedInput` error that names the file and line;
//! it is never coerced to zero.

use crate::error::{csv_error, io_error, ErrorKind, Result};
use crate::tables::{ActiveFlag, CustomerRow, CustomerTable, PurchaseRow, PurchasesTable};
use csv::{ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use serde_derive::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

const CUSTOMER_FIELDS: usize = 3;
const PURCHASE_FIELDS: usize = 4;

#[derive(Debug, Deserialize)]
struct CustomerRecord<'a> {
    id: u64,
    name: &'a str,
    active: &'a str,
}

#[derive(Debug, Deserialize)]
struct PurchaseRecord<'a> {
    timestamp: u64,
    customer_id: u64,
    product_code: &'a str,
    quantity: u64,
}

/// Reads tables from CSV files or arbitrary readers.
#[derive(Clone, Debug)]
pub struct TableReader {
    delimiter: u8,
}

impl Default for TableReader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl TableReader {
    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    fn reader_spec(&self) -> ReaderBuilder {
        let mut spec = ReaderBuilder::new();
        spec.delimiter(self.delimiter)
            .has_headers(true)
            .quoting(true)
            .double_quote(true);
        spec
    }

    fn open(path: &Path) -> Result<Box<dyn Read>> {
        let file = File::open(path).map_err(|e| io_error(path.display(), e))?;
        let reader: Box<dyn Read> = if path.to_string_lossy().ends_with("gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        Ok(reader)
    }

    /// Streams the customer rows of a file.
    ///
    /// The rows are not collected, so that the caller can hash each row while
    /// the file is being read.
    pub fn customers_from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<CustomerRows<Box<dyn Read>>> {
        let path = path.as_ref();
        info!(path = %path.display(), "Reading customer table");

        let reader = Self::open(path)?;
        Ok(self.customers_from_reader(reader, path.display().to_string()))
    }

    /// Streams customer rows from a reader.
    ///
    /// `source` names the reader in error messages.
    pub fn customers_from_reader<R: Read, S: Into<String>>(
        &self,
        reader: R,
        source: S,
    ) -> CustomerRows<R> {
        CustomerRows {
            reader: self.reader_spec().from_reader(reader),
            record: StringRecord::new(),
            source: source.into(),
        }
    }

    /// Loads the whole customer table in file order.
    pub fn load_customers<P: AsRef<Path>>(&self, path: P) -> Result<CustomerTable> {
        let mut table = CustomerTable::new();
        for row in self.customers_from_path(path)? {
            table.try_push(row?)?;
        }

        Ok(table)
    }

    /// Loads the purchases table in file order.
    pub fn load_purchases<P: AsRef<Path>>(&self, path: P) -> Result<PurchasesTable> {
        let path = path.as_ref();
        info!(path = %path.display(), "Reading purchases table");

        let reader = Self::open(path)?;
        self.purchases_from_reader(reader, path.display().to_string())
    }

    /// Loads a purchases table from a reader.
    ///
    /// `source` names the reader in error messages.
    pub fn purchases_from_reader<R: Read, S: Into<String>>(
        &self,
        reader: R,
        source: S,
    ) -> Result<PurchasesTable> {
        let source = source.into();
        let mut reader = self.reader_spec().from_reader(reader);
        let mut record = StringRecord::new();
        let mut table = PurchasesTable::new();

        while reader
            .read_record(&mut record)
            .map_err(|e| csv_error(&source, e))?
        {
            let line = line_of(&record);
            check_field_count(&record, PURCHASE_FIELDS, &source, line)?;

            let parsed: PurchaseRecord<'_> = record
                .deserialize(None)
                .map_err(|e| csv_error(&source, e))?;
            let row = PurchaseRow::new(
                parsed.timestamp,
                parsed.customer_id,
                parsed.product_code,
                parsed.quantity,
            )
            .map_err(|e| {
                ErrorKind::MalformedInput(format!("{}: line {}: {}", source, line, e))
            })?;

            table.try_push(row)?;
        }

        Ok(table)
    }
}

/// An iterator over the customer rows of a CSV input.
pub struct CustomerRows<R> {
    reader: csv::Reader<R>,
    record: StringRecord,
    source: String,
}

impl<R: Read> CustomerRows<R> {
    fn parse_record(&self) -> Result<CustomerRow> {
        let line = line_of(&self.record);
        check_field_count(&self.record, CUSTOMER_FIELDS, &self.source, line)?;

        let parsed: CustomerRecord<'_> = self
            .record
            .deserialize(None)
            .map_err(|e| csv_error(&self.source, e))?;

        let active = ActiveFlag::from_str_flag(parsed.active).ok_or_else(|| {
            ErrorKind::MalformedInput(format!(
                "{}: line {}: active flag must be 'Y' or 'N', found '{}'",
                self.source, line, parsed.active
            ))
        })?;

        CustomerRow::new(parsed.id, parsed.name, active).map_err(|e| {
            ErrorKind::MalformedInput(format!("{}: line {}: {}", self.source, line, e)).into()
        })
    }
}

impl<R: Read> Iterator for CustomerRows<R> {
    type Item = Result<CustomerRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(self.parse_record()),
            Ok(false) => None,
            Err(e) => Some(Err(csv_error(&self.source, e))),
        }
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |pos| pos.line())
}

fn check_field_count(record: &StringRecord, expected: usize, source: &str, line: u64) -> Result<()> {
    if record.len() != expected {
        Err(ErrorKind::MalformedInput(format!(
            "{}: line {}: expected {} fields, found {}",
            source,
            line,
            expected,
            record.len()
        )))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::TableReader;
    use crate::error::ErrorKind;
    use crate::tables::ActiveFlag;
    use std::error::Error;

    const CUSTOMERS: &str = "\"customerID\",\"customerName\",\"isActiveCustomer\"\n\
                             1,\"James\",N\n\
                             2,\"Mary\",Y\n";

    const PURCHASES: &str = "timestamp,customer_id,product_code,quantity\n\
                             100,2,\"1111111111111\",3\n\
                             1623447509730429941,1,1709605413695,5\n";

    #[test]
    fn reads_quoted_customers() -> Result<(), Box<dyn Error>> {
        let rows = TableReader::default()
            .customers_from_reader(CUSTOMERS.as_bytes(), "customers")
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].name.as_str(), "James");
        assert_eq!(rows[0].active, ActiveFlag::Inactive);
        assert_eq!(rows[1].name.as_str(), "Mary");
        assert_eq!(rows[1].active, ActiveFlag::Active);

        Ok(())
    }

    #[test]
    fn reads_purchases_with_and_without_quotes() -> Result<(), Box<dyn Error>> {
        let table = TableReader::default().purchases_from_reader(PURCHASES.as_bytes(), "p")?;

        assert_eq!(table.len(), 2);
        let rows = table.as_slice();
        assert_eq!(rows[0].timestamp, 100);
        assert_eq!(rows[0].customer_id, 2);
        assert_eq!(rows[0].product_code.as_str(), "1111111111111");
        assert_eq!(rows[0].quantity, 3);
        assert_eq!(rows[1].timestamp, 1_623_447_509_730_429_941);
        assert_eq!(rows[1].product_code.as_str(), "1709605413695");

        Ok(())
    }

    #[test]
    fn header_only_yields_empty_table() -> Result<(), Box<dyn Error>> {
        let table = TableReader::default()
            .purchases_from_reader("timestamp,customer_id,product_code,quantity\n".as_bytes(), "p")?;
        assert!(table.is_empty());
        Ok(())
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        let input = "timestamp,customer_id,product_code,quantity\n100,two,1111111111111,3\n";
        let err = TableReader::default()
            .purchases_from_reader(input.as_bytes(), "purchases.csv")
            .expect_err("Non-numeric customer ID must be rejected");

        match err.kind() {
            ErrorKind::MalformedInput(msg) => assert!(msg.contains("purchases.csv")),
            other => panic!("Unexpected error: {}", other),
        }
    }

    #[test]
    fn empty_numeric_field_is_malformed() {
        let input = "timestamp,customer_id,product_code,quantity\n100,2,1111111111111,\n";
        let err = TableReader::default()
            .purchases_from_reader(input.as_bytes(), "p")
            .expect_err("Empty quantity must be rejected");

        assert!(matches!(err.kind(), ErrorKind::MalformedInput(_)));
    }

    #[test]
    fn invalid_active_flag_is_malformed() {
        let input = "id,name,active\n1,\"James\",maybe\n";
        let result = TableReader::default()
            .customers_from_reader(input.as_bytes(), "c")
            .collect::<Result<Vec<_>, _>>();

        let err = result.expect_err("Active flag must be Y or N");
        match err.kind() {
            ErrorKind::MalformedInput(msg) => assert!(msg.contains("line 2")),
            other => panic!("Unexpected error: {}", other),
        }
    }

    #[test]
    fn overlong_name_is_malformed() {
        let input = "id,name,active\n1,\"Bartholomew-Maximilian\",Y\n";
        let result = TableReader::default()
            .customers_from_reader(input.as_bytes(), "c")
            .collect::<Result<Vec<_>, _>>();

        assert!(matches!(
            result.expect_err("Name is too long").kind(),
            ErrorKind::MalformedInput(_)
        ));
    }

    #[test]
    fn missing_field_is_malformed() {
        let input = "id,name,active\n1,\"James\"\n";
        let result = TableReader::default()
            .customers_from_reader(input.as_bytes(), "c")
            .collect::<Result<Vec<_>, _>>();

        assert!(matches!(
            result.expect_err("Record is short one field").kind(),
            ErrorKind::MalformedInput(_)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TableReader::default()
            .load_purchases("/nonexistent/purchases.csv")
            .expect_err("File does not exist");

        match err.kind() {
            ErrorKind::IoError(e) => assert!(e.to_string().contains("/nonexistent/purchases.csv")),
            other => panic!("Unexpected error: {}", other),
        }
    }
}
