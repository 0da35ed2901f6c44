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

//! # The SQL Operator Library
//!
//! `sql-ops` implements the equijoin of the purchases table with the customer
//! table. It includes:
//!
//! - A direct-address hash index over customers
//! - A sequential probe
//! - A data-parallel probe that runs on a compute backend, with a rayon-based
//!   CPU reference backend and a CUDA backend
//!
//! # Tuning parameters
//!
//! ## Work group size
//!
//! The parallel probe co-schedules units of work in groups.
//! `MAX_WORK_GROUP_SIZE` is a hard limit on the group size that all backends
//! must support. On CUDA, a work group is a thread block.
//!
//! `DEFAULT_WORK_GROUP_SIZE` is the group size used unless configured
//! otherwise.
//!
//! # CUDA support
//!
//! The CUDA backend is enabled with the `cuda` feature. It requires `nvcc` at
//! build time. The kernel is compiled as a [CUDA `fatbinary` module][fatbin],
//! which the backend loads into its own context when it is built. Dropping the
//! backend destroys the context and the module.
//!
//! [fatbin]: https://docs.nvidia.com/cuda/cuda-compiler-driver-nvcc/index.html#fatbinaries

pub mod error;
pub mod join;

/// Hard limit on the number of co-scheduled units of work.
pub const MAX_WORK_GROUP_SIZE: usize = 256;

/// The default number of co-scheduled units of work.
pub const DEFAULT_WORK_GROUP_SIZE: usize = MAX_WORK_GROUP_SIZE;
