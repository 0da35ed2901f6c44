/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright (c) 2019, Clemens Lutz <lutzcle@cml.li>
 * Author: Clemens Lutz <clemens.lutz@dfki.de>
 */

use crate::config::DataSetPaths;
use crate::error::{Result, ResultExt};
use crate::types::ProbeMethod;
use data_store::table_reader::TableReader;
use data_store::tables::{JoinedTable, PurchasesTable};
use sql_ops::join::{ComputeBackend, HashIndex, ParallelProbeDispatcher, Polarity, SequentialProbe};
use std::time::{Duration, Instant};

/// The loaded inputs of an equijoin run.
///
/// Both probe methods run against the same index and purchases.
pub struct EquiJoinBench {
    pub index: HashIndex,
    pub purchases: PurchasesTable,
    pub polarity: Polarity,
}

#[derive(Debug)]
pub struct EquiJoinPoint {
    pub probe_method: ProbeMethod,
    pub backend: Option<&'static str>,
    pub matched_rows: usize,
    pub probe_ns: f64,
}

impl EquiJoinBench {
    /// Hashes the customer table while reading it, then loads the purchases
    /// table.
    ///
    /// Returns the bench and the time spent loading.
    pub fn load(paths: &DataSetPaths, polarity: Polarity) -> Result<(Self, Duration)> {
        let reader = TableReader::default();
        let timer = Instant::now();

        let index = HashIndex::from_rows(reader.customers_from_path(&paths.customers)?)
            .chain_err(|| {
                format!(
                    "Failed to hash the customer table '{}'",
                    paths.customers.display()
                )
            })?;
        let purchases = reader.load_purchases(&paths.purchases)?;

        let bench = Self {
            index,
            purchases,
            polarity,
        };

        Ok((bench, timer.elapsed()))
    }

    /// Probes with the data-parallel backend of `dispatcher`.
    pub fn parallel_probe<B: ComputeBackend>(
        &self,
        dispatcher: &ParallelProbeDispatcher<B>,
    ) -> Result<(JoinedTable, EquiJoinPoint)> {
        let timer = Instant::now();
        let joined = dispatcher.dispatch(&self.index, &self.purchases, self.polarity)?;
        let elapsed = timer.elapsed();

        let point = EquiJoinPoint {
            probe_method: ProbeMethod::Parallel,
            backend: Some(dispatcher.backend().name()),
            matched_rows: joined.matched_len(),
            probe_ns: elapsed.as_nanos() as f64,
        };

        Ok((joined, point))
    }

    /// Probes one purchase after another on the calling thread.
    pub fn sequential_probe(&self) -> Result<(JoinedTable, EquiJoinPoint)> {
        let timer = Instant::now();
        let joined = SequentialProbe::probe(&self.index, &self.purchases, self.polarity)?;
        let elapsed = timer.elapsed();

        let point = EquiJoinPoint {
            probe_method: ProbeMethod::Sequential,
            backend: None,
            matched_rows: joined.matched_len(),
            probe_ns: elapsed.as_nanos() as f64,
        };

        Ok((joined, point))
    }
}
