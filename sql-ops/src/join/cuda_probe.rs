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

//! Parallel probe on a CUDA GPU.
//!
//! The backend copies the hash index and the purchases into device memory,
//! allocates a device output of the same length as the purchases, and
//! launches one GPU thread per purchase. The thread block size is the work
//! group size. After the stream is synchronized, the output is copied back
//! into the caller's joined table.
//!
//! The kernel is in `cudautils/equijoin_probe.cu`. It is compiled into a
//! fatbinary by `build.rs`, and loaded once per backend instance.

use super::parallel_probe::{validate_output_len, validate_work_group_size, ComputeBackend};
use super::{HashIndex, Polarity};
use crate::error::{ErrorKind, Result};
use crate::DEFAULT_WORK_GROUP_SIZE;
use data_store::tables::{JoinedRow, PurchaseRow};
use rustacuda::launch;
use rustacuda::prelude::*;
use std::convert::TryFrom;
use std::ffi::CString;
use tracing::debug;

/// A compute backend that runs the probe on a CUDA device.
///
/// Fields are dropped in declaration order. The stream and module must be
/// dropped before their context.
pub struct CudaBackend {
    stream: Stream,
    module: Module,
    _context: Context,
    device_name: String,
    work_group_size: usize,
}

/// Build a `CudaBackend`.
#[derive(Clone, Debug)]
pub struct CudaBackendBuilder {
    device_id: u32,
    work_group_size: usize,
}

impl Default for CudaBackendBuilder {
    fn default() -> Self {
        Self {
            device_id: 0,
            work_group_size: DEFAULT_WORK_GROUP_SIZE,
        }
    }
}

impl CudaBackendBuilder {
    pub fn device_id(mut self, device_id: u32) -> Self {
        self.device_id = device_id;
        self
    }

    pub fn work_group_size(mut self, work_group_size: usize) -> Self {
        self.work_group_size = work_group_size;
        self
    }

    /// Initializes CUDA, creates a context on the device, and loads the probe
    /// kernel.
    pub fn build(&self) -> Result<CudaBackend> {
        validate_work_group_size(self.work_group_size)?;

        rustacuda::init(CudaFlags::empty())?;
        let device = Device::get_device(self.device_id)?;
        let context =
            Context::create_and_push(ContextFlags::MAP_HOST | ContextFlags::SCHED_AUTO, device)?;

        let module_path = CString::new(env!("CUDAUTILS_PATH")).map_err(|_| {
            ErrorKind::DeviceError("CUDAUTILS_PATH contains a NUL byte".to_string())
        })?;
        let module = Module::load_from_file(&module_path)?;
        let stream = Stream::new(StreamFlags::NON_BLOCKING, None)?;
        let device_name = device.name()?;

        debug!(device = %device_name, "Initialized CUDA backend");

        Ok(CudaBackend {
            stream,
            module,
            _context: context,
            device_name,
            work_group_size: self.work_group_size,
        })
    }
}

impl CudaBackend {
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl ComputeBackend for CudaBackend {
    fn name(&self) -> &'static str {
        "cuda"
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

        if purchases.is_empty() {
            return Ok(());
        }

        // Without customers, no purchase can match.
        if index.is_empty() {
            joined.iter_mut().for_each(|row| *row = JoinedRow::sentinel());
            return Ok(());
        }

        let purchases_len = purchases.len() as u64;
        let customers_len = index.len() as u64;
        let block_size = u32::try_from(self.work_group_size).map_err(|_| {
            ErrorKind::IntegerOverflow("Work group size exceeds the block size limit".to_string())
        })?;
        let grid_size = u32::try_from((purchases_len + u64::from(block_size) - 1) / u64::from(block_size))
            .map_err(|_| {
                ErrorKind::IntegerOverflow("Purchases exceed the CUDA grid size".to_string())
            })?;

        let mut customers_dev = DeviceBuffer::from_slice(index.as_slice())?;
        let mut purchases_dev = DeviceBuffer::from_slice(purchases)?;
        let mut joined_dev = unsafe { DeviceBuffer::<JoinedRow>::uninitialized(joined.len())? };

        let module = &self.module;
        let stream = &self.stream;
        let active_flag = polarity.as_flag() as u8;

        unsafe {
            launch!(module.equijoin_probe<<<grid_size, block_size, 0, stream>>>(
                    customers_dev.as_device_ptr(),
                    customers_len,
                    purchases_dev.as_device_ptr(),
                    joined_dev.as_device_ptr(),
                    purchases_len,
                    active_flag
                    ))?;
        }

        // The output is only valid after all threads have finished.
        stream.synchronize()?;
        joined_dev.copy_to(joined)?;

        Ok(())
    }
}
