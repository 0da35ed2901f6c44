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

//! Data-parallel probe of the purchases table.
//!
//! The probe is split into one unit of work per purchase. A unit reads the
//! whole hash index and its own purchase, and writes exactly one output slot
//! at the purchase's position. Units never touch each other's slots, so they
//! run without any synchronization.
//!
//! Units are co-scheduled in work groups. The work group size is bounded by
//! `MAX_WORK_GROUP_SIZE`, which is a hard limit of the backends. Exceeding it
//! is an error; the size is never clamped.
//!
//! The actual execution is delegated to a `ComputeBackend`. A backend's
//! `submit` is synchronous: when it returns, all units have completed and the
//! results are visible in host memory.

use super::probe::probe_row;
use super::{HashIndex, Polarity};
use crate::error::{ErrorKind, Result};
use crate::{DEFAULT_WORK_GROUP_SIZE, MAX_WORK_GROUP_SIZE};
use data_store::tables::{JoinedRow, JoinedTable, PurchaseRow, PurchasesTable};
use tracing::debug;

/// Executes the units of work of a parallel probe.
pub trait ComputeBackend {
    /// A short name for messages and measurements.
    fn name(&self) -> &'static str;

    /// The number of units that are co-scheduled.
    fn work_group_size(&self) -> usize;

    /// Probes all `purchases` against `index` and writes the results into
    /// `joined`.
    ///
    /// `joined` must be pre-sized to the number of purchases. Returns only
    /// after every result has been written back to `joined`.
    fn submit(
        &self,
        index: &HashIndex,
        purchases: &[PurchaseRow],
        joined: &mut [JoinedRow],
        polarity: Polarity,
    ) -> Result<()>;
}

impl<B: ComputeBackend + ?Sized> ComputeBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn work_group_size(&self) -> usize {
        (**self).work_group_size()
    }

    fn submit(
        &self,
        index: &HashIndex,
        purchases: &[PurchaseRow],
        joined: &mut [JoinedRow],
        polarity: Polarity,
    ) -> Result<()> {
        (**self).submit(index, purchases, joined, polarity)
    }
}

/// Checks a work group size against the hard backend limit.
pub(crate) fn validate_work_group_size(work_group_size: usize) -> Result<()> {
    if work_group_size == 0 || work_group_size > MAX_WORK_GROUP_SIZE {
        Err(ErrorKind::InvalidArgument(format!(
            "Work group size must be between 1 and {}, but is {}",
            MAX_WORK_GROUP_SIZE, work_group_size
        )))?;
    }

    Ok(())
}

/// Checks that the output has one slot per purchase.
pub(crate) fn validate_output_len(purchases: &[PurchaseRow], joined: &[JoinedRow]) -> Result<()> {
    if purchases.len() != joined.len() {
        Err(ErrorKind::InvalidArgument(format!(
            "Joined table has {} rows, but must be pre-sized to the purchases table ({} rows)",
            joined.len(),
            purchases.len()
        )))?;
    }

    Ok(())
}

/// Runs a parallel probe on a compute backend.
#[derive(Debug)]
pub struct ParallelProbeDispatcher<B> {
    backend: B,
}

impl<B: ComputeBackend> ParallelProbeDispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Probes all purchases into a freshly allocated joined table.
    ///
    /// The output is sized to the purchase count before the backend starts.
    /// It is returned only after the backend has finished.
    pub fn dispatch(
        &self,
        index: &HashIndex,
        purchases: &PurchasesTable,
        polarity: Polarity,
    ) -> Result<JoinedTable> {
        validate_work_group_size(self.backend.work_group_size())?;

        let mut joined = JoinedTable::with_len(purchases.len())?;

        debug!(
            backend = self.backend.name(),
            units = purchases.len(),
            work_group_size = self.backend.work_group_size(),
            %polarity,
            "Dispatching parallel probe"
        );

        self.backend
            .submit(index, purchases.as_slice(), joined.as_mut_slice(), polarity)?;

        Ok(joined)
    }
}

/// An in-process reference backend that runs on a rayon thread pool.
///
/// Each work group is a task on the thread pool. All units of a work group run
/// on the same worker thread.
#[derive(Debug)]
pub struct CpuReferenceBackend {
    thread_pool: rayon::ThreadPool,
    work_group_size: usize,
}

/// Build a `CpuReferenceBackend`.
#[derive(Clone, Debug)]
pub struct CpuReferenceBackendBuilder {
    threads: usize,
    work_group_size: usize,
}

impl Default for CpuReferenceBackendBuilder {
    fn default() -> Self {
        Self {
            threads: 0,
            work_group_size: DEFAULT_WORK_GROUP_SIZE,
        }
    }
}

impl CpuReferenceBackendBuilder {
    /// Sets the number of worker threads.
    ///
    /// Zero selects rayon's default, which is one thread per logical core.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn work_group_size(mut self, work_group_size: usize) -> Self {
        self.work_group_size = work_group_size;
        self
    }

    pub fn build(&self) -> Result<CpuReferenceBackend> {
        validate_work_group_size(self.work_group_size)?;

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("probe-worker-{}", i))
            .build()?;

        Ok(CpuReferenceBackend {
            thread_pool,
            work_group_size: self.work_group_size,
        })
    }
}

impl CpuReferenceBackend {
    /// The number of worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.thread_pool.current_num_threads()
    }
}

impl ComputeBackend for CpuReferenceBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn work_group_size(&self) -> usize {
        self.work_group_size
    }

    fn submit(
        &self,
        index: &HashIndex,
        purchases: &[PurchaseRow],
        joined: &mut [JoinedRow],
        polarity: Polarity,
    ) -> Result<()> {
        validate_output_len(purchases, joined)?;

        let group_size = self.work_group_size;

        // The scope only returns after all work groups have finished.
        self.thread_pool.scope(|s| {
            for (purchase_group, joined_group) in purchases
                .chunks(group_size)
                .zip(joined.chunks_mut(group_size))
            {
                s.spawn(move |_| {
                    purchase_group
                        .iter()
                        .zip(joined_group.iter_mut())
                        .for_each(|(purchase, out)| *out = probe_row(index, purchase, polarity));
                });
            }
        });

        Ok(())
    }
}
