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

//! Direct-address hash index over the customer table.
//!
//! The index is a perfect hash table: the customer with id `k` is stored at
//! address `k - 1`. This requires customer ids to be dense and 1-based, i.e.,
//! the ids of `N` customers are exactly `1..=N`. The builder validates this
//! precondition when the index is finished, instead of assuming it.
//!
//! The builder grows the table while rows arrive, so that the index can be
//! built while the customer file is still being read. Capacity doubles until
//! the address of the largest id seen so far fits. The row count plays no role
//! in sizing, so out-of-order and sparse ids never write out of bounds.

use crate::error::{ErrorKind, Result};
use data_store::tables::{CustomerRow, NULL_CUSTOMER_ID};
use std::convert::TryFrom;
use tracing::debug;

/// A finished direct-address index over customers.
///
/// Holds exactly one row per customer id in `1..=len()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HashIndex {
    rows: Vec<CustomerRow>,
}

/// Builds a `HashIndex` incrementally.
#[derive(Debug, Default)]
pub struct HashIndexBuilder {
    slots: Vec<CustomerRow>,
    inserted: usize,
    max_id: u64,
}

impl HashIndexBuilder {
    const INITIAL_CAPACITY: usize = 1024;

    /// Inserts a customer at address `id - 1`.
    ///
    /// Fails for id 0, for duplicate ids, and if the slots cannot be
    /// allocated.
    pub fn insert(&mut self, row: CustomerRow) -> Result<()> {
        if row.id == NULL_CUSTOMER_ID {
            Err(ErrorKind::MalformedInput(
                "Customer ID 0 is reserved for sentinel rows".to_string(),
            ))?;
        }

        let addr = usize::try_from(row.id - 1).map_err(|_| {
            ErrorKind::IntegerOverflow(format!(
                "Customer ID {} exceeds the address space",
                row.id
            ))
        })?;

        if addr >= self.slots.len() {
            self.grow(addr)?;
        }

        let slot = &mut self.slots[addr];
        if slot.id != NULL_CUSTOMER_ID {
            Err(ErrorKind::MalformedInput(format!(
                "Duplicate customer ID {}",
                row.id
            )))?;
        }

        *slot = row;
        self.inserted += 1;
        self.max_id = self.max_id.max(row.id);

        Ok(())
    }

    /// Doubles the capacity until `addr` is addressable.
    fn grow(&mut self, addr: usize) -> Result<()> {
        let mut capacity = self.slots.len().max(Self::INITIAL_CAPACITY);
        while capacity <= addr {
            capacity = capacity.checked_mul(2).ok_or_else(|| {
                ErrorKind::IntegerOverflow("Failed to compute hash index capacity".to_string())
            })?;
        }

        debug!(
            from = self.slots.len(),
            to = capacity,
            "Growing customer hash index"
        );

        self.slots.try_reserve_exact(capacity - self.slots.len())?;
        self.slots.resize(capacity, CustomerRow::default());

        Ok(())
    }

    /// Number of rows inserted so far.
    pub fn len(&self) -> usize {
        self.inserted
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }

    /// Finishes the index.
    ///
    /// Fails with `MalformedInput` if the ids are not dense, i.e., if some id
    /// in `1..=max_id` was never inserted.
    pub fn build(self) -> Result<HashIndex> {
        let max_id = usize::try_from(self.max_id).map_err(|_| {
            ErrorKind::IntegerOverflow("Maximum customer ID exceeds the address space".to_string())
        })?;

        if self.inserted != max_id {
            Err(ErrorKind::MalformedInput(format!(
                "Customer IDs must be dense and start at 1, but found {} customers with maximum ID {}",
                self.inserted, self.max_id
            )))?;
        }

        let mut rows = self.slots;
        rows.truncate(max_id);

        Ok(HashIndex { rows })
    }
}

impl HashIndex {
    /// Builds an index from a stream of customer rows.
    ///
    /// The first error in the stream aborts the build. Rejected rows are
    /// reported by their 1-based position in the stream.
    pub fn from_rows<I, E>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = std::result::Result<CustomerRow, E>>,
        crate::error::Error: From<E>,
    {
        let mut builder = HashIndexBuilder::default();
        for (position, row) in rows.into_iter().enumerate() {
            builder.insert(row?).map_err(|e| match e.kind() {
                ErrorKind::MalformedInput(msg) => {
                    ErrorKind::MalformedInput(format!("customer row {}: {}", position + 1, msg))
                        .into()
                }
                _ => e,
            })?;
        }
        builder.build()
    }

    /// Looks up a customer by id.
    ///
    /// Returns `None` for ids outside of `1..=len()`.
    pub fn get(&self, customer_id: u64) -> Option<&CustomerRow> {
        let addr = customer_id.checked_sub(1)?;
        usize::try_from(addr)
            .ok()
            .and_then(|addr| self.rows.get(addr))
    }

    /// The number of customers.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The customers ordered by address.
    pub fn as_slice(&self) -> &[CustomerRow] {
        self.rows.as_slice()
    }
}
