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

//! Single-threaded probe of the purchases table.

use super::{HashIndex, Polarity};
use crate::error::{ErrorKind, Result};
use data_store::tables::{JoinedRow, JoinedTable, PurchaseRow, PurchasesTable};

/// Classifies one purchase.
///
/// Looks up the customer at address `customer_id - 1`. If the customer exists
/// and its active flag agrees with `polarity`, the result is a matched row.
/// Otherwise, the purchase has no qualifying match and the result is a
/// sentinel.
///
/// All probe backends share this rule. The CUDA kernel implements the same
/// rule and must be kept in sync.
#[inline]
pub fn probe_row(index: &HashIndex, purchase: &PurchaseRow, polarity: Polarity) -> JoinedRow {
    match index.get(purchase.customer_id) {
        Some(customer) if polarity.admits(customer.active) => {
            JoinedRow::matched(purchase, customer)
        }
        _ => JoinedRow::sentinel(),
    }
}

/// Probes the purchases one after another on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialProbe;

impl SequentialProbe {
    /// Probes all purchases into a freshly allocated joined table.
    ///
    /// The result has exactly one row per purchase, in purchase order.
    pub fn probe(
        index: &HashIndex,
        purchases: &PurchasesTable,
        polarity: Polarity,
    ) -> Result<JoinedTable> {
        let mut joined = JoinedTable::with_len(purchases.len())?;
        Self::probe_into(index, purchases.as_slice(), joined.as_mut_slice(), polarity)?;
        Ok(joined)
    }

    /// Probes all purchases into a pre-sized output.
    ///
    /// `joined` must have the same length as `purchases`.
    pub fn probe_into(
        index: &HashIndex,
        purchases: &[PurchaseRow],
        joined: &mut [JoinedRow],
        polarity: Polarity,
    ) -> Result<()> {
        if purchases.len() != joined.len() {
            Err(ErrorKind::InvalidArgument(format!(
                "Joined table has {} rows, but must have one row per purchase ({})",
                joined.len(),
                purchases.len()
            )))?;
        }

        purchases
            .iter()
            .zip(joined.iter_mut())
            .for_each(|(purchase, out)| *out = probe_row(index, purchase, polarity));

        Ok(())
    }
}
