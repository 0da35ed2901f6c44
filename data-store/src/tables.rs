// Copyright 2022 Clemens Lutz
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

//! In-memory tables for the customer, purchases, and joined results.
//!
//! Rows are plain `#[repr(C)]` structs with fixed-width string fields. This
//! lets the probe backends ship whole tables to a device without any
//! serialization step. The struct layouts must be kept in sync with their
//! counterparts in `sql-ops/cudautils/equijoin_probe.cu`.

use crate::error::{ErrorKind, Result};
use std::fmt;

/// Maximum number of bytes in a customer's first name.
pub const CUSTOMER_NAME_MAX_BYTES: usize = 20;

/// Number of bytes in an EAN-13 product code.
pub const PRODUCT_CODE_BYTES: usize = 13;

/// Customer ID that marks a joined row as filtered out.
pub const NULL_CUSTOMER_ID: u64 = 0;

/// Number of fields in a serialized joined row.
pub const JOINED_ROW_FIELDS: usize = 5;

pub type CustomerName = FixedStr<CUSTOMER_NAME_MAX_BYTES>;
pub type ProductCode = FixedStr<PRODUCT_CODE_BYTES>;

/// A string stored inline in a fixed number of bytes.
///
/// Unused trailing bytes are zero. Thus, the string itself must not contain
/// a `NUL` byte.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedStr<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedStr<N> {
    pub const fn empty() -> Self {
        Self { bytes: [0; N] }
    }

    /// Copies `s` into a fixed-width string.
    ///
    /// Returns `None` if `s` is longer than `N` bytes or contains a `NUL`
    /// byte. The string is never truncated.
    pub fn new(s: &str) -> Option<Self> {
        if s.len() > N || s.as_bytes().contains(&0) {
            return None;
        }

        let mut bytes = [0; N];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Some(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.iter().position(|&b| b == 0).unwrap_or(N)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len()]).unwrap_or_default()
    }
}

impl<const N: usize> Default for FixedStr<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> fmt::Debug for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> fmt::Display for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a customer is still active.
///
/// The discriminants are the characters used in the CSV files.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActiveFlag {
    Inactive = b'N',
    Active = b'Y',
}

impl ActiveFlag {
    pub fn from_str_flag(s: &str) -> Option<Self> {
        match s {
            "Y" => Some(ActiveFlag::Active),
            "N" => Some(ActiveFlag::Inactive),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        self as u8 as char
    }
}

impl Default for ActiveFlag {
    fn default() -> Self {
        ActiveFlag::Inactive
    }
}

/// A row of the customer table.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CustomerRow {
    pub id: u64,
    pub name: CustomerName,
    pub active: ActiveFlag,
}

impl CustomerRow {
    pub fn new(id: u64, name: &str, active: ActiveFlag) -> Result<Self> {
        let name = CustomerName::new(name).ok_or_else(|| {
            ErrorKind::MalformedInput(format!(
                "Customer name '{}' is longer than {} bytes or contains a NUL byte",
                name, CUSTOMER_NAME_MAX_BYTES
            ))
        })?;

        Ok(Self { id, name, active })
    }
}

/// A row of the purchases table.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurchaseRow {
    /// Time of purchase in nanoseconds since the Unix epoch.
    pub timestamp: u64,
    pub customer_id: u64,
    pub product_code: ProductCode,
    pub quantity: u64,
}

impl PurchaseRow {
    pub fn new(timestamp: u64, customer_id: u64, product_code: &str, quantity: u64) -> Result<Self> {
        let code = ProductCode::new(product_code)
            .filter(|code| code.len() == PRODUCT_CODE_BYTES)
            .ok_or_else(|| {
                ErrorKind::MalformedInput(format!(
                    "Product code '{}' must be exactly {} bytes",
                    product_code, PRODUCT_CODE_BYTES
                ))
            })?;

        Ok(Self {
            timestamp,
            customer_id,
            product_code: code,
            quantity,
        })
    }
}

/// A row of the join result.
///
/// A row is either matched, or it is a sentinel that marks the purchase at
/// the same position as filtered out. On a sentinel, only `customer_id` and
/// `customer_name` carry a meaning. Consumers must go through
/// [`JoinedRow::record`], which refuses to expose the other fields of a
/// sentinel.
///
/// The fields are private:
///
/// ```compile_fail
/// let row = data_store::tables::JoinedRow::sentinel();
/// let _ = row.quantity;
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinedRow {
    timestamp: u64,
    customer_id: u64,
    customer_name: CustomerName,
    product_code: ProductCode,
    quantity: u64,
}

/// The fields of a matched joined row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinedRecord<'a> {
    pub timestamp: u64,
    pub customer_id: u64,
    pub customer_name: &'a str,
    pub product_code: &'a str,
    pub quantity: u64,
}

impl JoinedRow {
    pub const fn sentinel() -> Self {
        Self {
            timestamp: 0,
            customer_id: NULL_CUSTOMER_ID,
            customer_name: CustomerName::empty(),
            product_code: ProductCode::empty(),
            quantity: 0,
        }
    }

    pub fn matched(purchase: &PurchaseRow, customer: &CustomerRow) -> Self {
        Self {
            timestamp: purchase.timestamp,
            customer_id: customer.id,
            customer_name: customer.name,
            product_code: purchase.product_code,
            quantity: purchase.quantity,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.customer_id == NULL_CUSTOMER_ID && self.customer_name.is_empty()
    }

    /// Returns the fields of a matched row, and `None` for a sentinel.
    pub fn record(&self) -> Option<JoinedRecord<'_>> {
        if self.is_sentinel() {
            None
        } else {
            Some(JoinedRecord {
                timestamp: self.timestamp,
                customer_id: self.customer_id,
                customer_name: self.customer_name.as_str(),
                product_code: self.product_code.as_str(),
                quantity: self.quantity,
            })
        }
    }
}

impl Default for JoinedRow {
    fn default() -> Self {
        Self::sentinel()
    }
}

/// A row count plus a contiguous sequence of rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table<T> {
    rows: Vec<T>,
}

pub type CustomerTable = Table<CustomerRow>;
pub type PurchasesTable = Table<PurchaseRow>;
pub type JoinedTable = Table<JoinedRow>;

impl<T> Table<T> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<T>) -> Self {
        Self { rows }
    }

    /// Appends a row, growing the table by doubling its capacity.
    pub fn try_push(&mut self, row: T) -> Result<()> {
        self.rows.try_reserve(1)?;
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        self.rows.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.rows.as_mut_slice()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}

impl JoinedTable {
    /// Allocates a result table with `len` sentinel rows.
    ///
    /// Probe backends never resize their output, thus the length must be
    /// set to the purchases row count before the probe starts.
    pub fn with_len(len: usize) -> Result<Self> {
        let mut rows = Vec::new();
        rows.try_reserve_exact(len).map_err(|e| {
            ErrorKind::AllocationError(format!(
                "Failed to allocate {} joined rows: {}",
                len, e
            ))
        })?;
        rows.resize(len, JoinedRow::sentinel());

        Ok(Self { rows })
    }

    /// Number of rows that survive the polarity filter.
    pub fn matched_len(&self) -> usize {
        self.rows.iter().filter(|row| !row.is_sentinel()).count()
    }
}

impl<'a, T> IntoIterator for &'a Table<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Conversion of a row into CSV fields.
///
/// String fields are quoted, numeric fields are not. Rows that must not be
/// serialized return `None`.
pub trait CsvRow {
    fn header() -> &'static [&'static str];
    fn csv_fields(&self) -> Option<Vec<String>>;
}

/// Wraps a string field in double quotes, doubling any embedded quotes.
pub(crate) fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if c == '"' {
            quoted.push('"');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

impl CsvRow for CustomerRow {
    fn header() -> &'static [&'static str] {
        &["customerID", "customerName", "isActiveCustomer"]
    }

    fn csv_fields(&self) -> Option<Vec<String>> {
        Some(vec![
            self.id.to_string(),
            quote(self.name.as_str()),
            self.active.as_char().to_string(),
        ])
    }
}

impl CsvRow for PurchaseRow {
    fn header() -> &'static [&'static str] {
        &["epochTimePurchased", "customerID", "purchaseEAN13", "purchaseQuantity"]
    }

    fn csv_fields(&self) -> Option<Vec<String>> {
        Some(vec![
            self.timestamp.to_string(),
            self.customer_id.to_string(),
            quote(self.product_code.as_str()),
            self.quantity.to_string(),
        ])
    }
}

impl CsvRow for JoinedRow {
    fn header() -> &'static [&'static str] {
        &[
            "timestamp",
            "customer_id",
            "customer_name",
            "product_code",
            "quantity",
        ]
    }

    fn csv_fields(&self) -> Option<Vec<String>> {
        self.record().map(|r| {
            vec![
                r.timestamp.to_string(),
                r.customer_id.to_string(),
                quote(r.customer_name),
                quote(r.product_code),
                r.quantity.to_string(),
            ]
        })
    }
}

impl<T: CsvRow> fmt::Display for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", T::header().join(","))?;
        self.rows
            .iter()
            .filter_map(|row| row.csv_fields())
            .try_for_each(|fields| writeln!(f, "{}", fields.join(",")))
    }
}

#[cfg(feature = "cuda")]
mod device_copy {
    use super::{CustomerRow, JoinedRow, PurchaseRow};
    use rustacuda::memory::DeviceCopy;

    // All rows are plain old data without pointers.
    unsafe impl DeviceCopy for CustomerRow {}
    unsafe impl DeviceCopy for PurchaseRow {}
    unsafe impl DeviceCopy for JoinedRow {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::result::Result;

    #[test]
    fn fixed_str_rejects_long_strings() {
        assert!(CustomerName::new("abcdefghijklmnopqrstu").is_none());
        assert_eq!(
            CustomerName::new("abcdefghijklmnopqrst").map(|n| n.len()),
            Some(20)
        );
        assert!(CustomerName::new("a\0b").is_none());
    }

    #[test]
    fn fixed_str_round_trips_utf8() {
        let name = CustomerName::new("Zoë").expect("Name should fit");
        assert_eq!(name.as_str(), "Zoë");
        assert_eq!(name.len(), 4);
    }

    #[test]
    fn product_code_must_be_full_width() {
        assert!(PurchaseRow::new(1, 1, "123456789012", 1).is_err());
        assert!(PurchaseRow::new(1, 1, "12345678901234", 1).is_err());
        assert!(PurchaseRow::new(1, 1, "1234567890123", 1).is_ok());
    }

    #[test]
    fn sentinel_has_no_record() {
        let row = JoinedRow::sentinel();
        assert!(row.is_sentinel());
        assert_eq!(row.record(), None);
        assert_eq!(row.csv_fields(), None);
    }

    #[test]
    fn matched_row_copies_fields() -> Result<(), Box<dyn Error>> {
        let customer = CustomerRow::new(2, "Mary", ActiveFlag::Active)?;
        let purchase = PurchaseRow::new(100, 2, "1111111111111", 3)?;
        let row = JoinedRow::matched(&purchase, &customer);

        assert!(!row.is_sentinel());
        assert_eq!(
            row.record(),
            Some(JoinedRecord {
                timestamp: 100,
                customer_id: 2,
                customer_name: "Mary",
                product_code: "1111111111111",
                quantity: 3,
            })
        );

        Ok(())
    }

    #[test]
    fn joined_table_starts_as_sentinels() -> Result<(), Box<dyn Error>> {
        let table = JoinedTable::with_len(16)?;
        assert_eq!(table.len(), 16);
        assert!(table.iter().all(JoinedRow::is_sentinel));
        assert_eq!(table.matched_len(), 0);
        Ok(())
    }

    #[test]
    fn display_skips_sentinels() -> Result<(), Box<dyn Error>> {
        let customer = CustomerRow::new(2, "Mary", ActiveFlag::Active)?;
        let purchase = PurchaseRow::new(100, 2, "1111111111111", 3)?;
        let table = Table::from_rows(vec![
            JoinedRow::sentinel(),
            JoinedRow::matched(&purchase, &customer),
        ]);

        assert_eq!(
            table.to_string(),
            "timestamp,customer_id,customer_name,product_code,quantity\n\
             100,2,\"Mary\",\"1111111111111\",3\n"
        );

        Ok(())
    }

    #[test]
    fn quote_doubles_embedded_quotes() {
        assert_eq!(quote("a\"b"), "\"a\"\"b\"");
    }
}
