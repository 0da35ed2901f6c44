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

//! Equijoin of the purchases table with the customer table.
//!
//! The customer table is the build side. Its rows are stored in a
//! direct-address [`HashIndex`](hash_index::HashIndex). The purchases table is
//! the probe side. Each purchase yields exactly one joined row at the same
//! position, which is either matched or a sentinel.

#[cfg(feature = "cuda")]
pub mod cuda_probe;
pub mod hash_index;
pub mod parallel_probe;
pub mod probe;

pub use hash_index::{HashIndex, HashIndexBuilder};
pub use parallel_probe::{ComputeBackend, CpuReferenceBackend, ParallelProbeDispatcher};
pub use probe::{probe_row, SequentialProbe};

use data_store::tables::ActiveFlag;

/// The customer status that a join run keeps.
///
/// Purchases of customers with the other status become sentinel rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Polarity {
    Active,
    Inactive,
}

impl Polarity {
    /// Returns `true` if a customer with `flag` qualifies for the join.
    pub fn admits(self, flag: ActiveFlag) -> bool {
        self.as_flag() == flag
    }

    /// The active flag that qualifying customers carry.
    pub fn as_flag(self) -> ActiveFlag {
        match self {
            Polarity::Active => ActiveFlag::Active,
            Polarity::Inactive => ActiveFlag::Inactive,
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Active => f.write_str("active"),
            Polarity::Inactive => f.write_str("inactive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Polarity;
    use data_store::tables::ActiveFlag;

    #[test]
    fn polarity_admits_matching_flag_only() {
        assert!(Polarity::Active.admits(ActiveFlag::Active));
        assert!(!Polarity::Active.admits(ActiveFlag::Inactive));
        assert!(Polarity::Inactive.admits(ActiveFlag::Inactive));
        assert!(!Polarity::Inactive.admits(ActiveFlag::Active));
    }
}
