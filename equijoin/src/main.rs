/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2018 German Research Center for Artificial Intelligence (DFKI)
 * Author: Clemens Lutz <clemens.lutz@dfki.de>
 */

mod config;
mod error;
mod measurement;
mod types;

use crate::config::{DataSetPaths, RunConfig};
use crate::error::Result;
use crate::measurement::data_point::DataPoint;
use crate::measurement::equijoin_bench::EquiJoinBench;
use crate::measurement::harness;
use crate::types::*;

use data_store::compare;
use data_store::table_writer;

use sql_ops::join::parallel_probe::CpuReferenceBackendBuilder;
use sql_ops::join::{ComputeBackend, ParallelProbeDispatcher};

use std::path::{Path, PathBuf};
use std::time::Duration;

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse commandline arguments
    let cmd = CmdOpt::from_args();
    let config = RunConfig::from_cmd(&cmd)?;

    let (bench, load_time) = EquiJoinBench::load(&config.paths, config.polarity)?;
    println!(
        "Loaded hashed customer table with {} row(s) and purchases table with {} row(s) in {:.6} seconds\n",
        bench.index.len(),
        bench.purchases.len(),
        secs(load_time)
    );

    let dispatcher = ParallelProbeDispatcher::new(build_backend(&config)?);

    // Construct data point template for CSV
    let dp = DataPoint::new()?
        .fill_from_run_config(&config)
        .fill_from_equijoin_bench(&bench)
        .set_load_time(load_time);

    let paths = &config.paths;
    harness::measure("equijoin", config.repeat, config.csv.clone(), dp, |warm_up| {
        // Only one output table is alive at a time
        let (joined, parallel_point) = bench.parallel_probe(&dispatcher)?;
        println!(
            "Parallelized hash equijoin probing of hashed customer table with {} row(s) and purchases table with {} row(s) on {} backend took {:.6} seconds\n",
            bench.index.len(),
            bench.purchases.len(),
            dispatcher.backend().name(),
            parallel_point.probe_ns / 1_000_000_000.0
        );
        if warm_up {
            table_writer::write_table_to_path(&joined, paths.result(ProbeMethod::Parallel))?;
        }
        drop(joined);

        let (joined, serial_point) = bench.sequential_probe()?;
        println!(
            "Serial hash equijoin probing of hashed customer table with {} row(s) and purchases table with {} row(s) in main memory took {:.6} seconds\n",
            bench.index.len(),
            bench.purchases.len(),
            serial_point.probe_ns / 1_000_000_000.0
        );
        if warm_up {
            table_writer::write_table_to_path(&joined, paths.result(ProbeMethod::Sequential))?;
        }

        Ok(vec![parallel_point, serial_point])
    })?;

    verify(paths, config.reference_optional)?;

    Ok(())
}

#[derive(StructOpt)]
#[structopt(
    name = "equijoin",
    about = "Joins purchases with active or inactive customers on a parallel backend and on the CPU, and verifies both results"
)]
struct CmdOpt {
    /// Number of times to repeat the probes after the first run
    #[structopt(short = "r", long = "repeat", default_value = "0")]
    repeat: u32,

    /// Output filename for measurement CSV file
    #[structopt(long = "csv", parse(from_os_str))]
    csv: Option<PathBuf>,

    /// Use the example or a custom data set.
    //   example: The data set shipped in the data directory
    //   custom: A data set written by the `generate` tool
    #[structopt(
        short = "s",
        long = "data-set",
        default_value = "Example",
        possible_values = &ArgDataSet::variants(),
        case_insensitive = true
    )]
    data_set: ArgDataSet,

    /// Directory that contains the data set files
    #[structopt(long = "data-dir", default_value = "./data", parse(from_os_str))]
    data_dir: PathBuf,

    /// Load the customer table from this file instead of the data set's
    #[structopt(long = "customers", parse(from_os_str))]
    customers: Option<PathBuf>,

    /// Load the purchases table from this file instead of the data set's
    #[structopt(long = "purchases", parse(from_os_str))]
    purchases: Option<PathBuf>,

    /// Verify the results against this file instead of the data set's reference
    #[structopt(long = "reference", parse(from_os_str))]
    reference: Option<PathBuf>,

    /// Join purchases with active or with inactive customers.
    #[structopt(
        short = "p",
        long = "polarity",
        default_value = "Active",
        possible_values = &ArgPolarity::variants(),
        case_insensitive = true
    )]
    polarity: ArgPolarity,

    /// Execute the parallel probe on the CPU or on a CUDA device.
    #[structopt(
        long = "backend",
        default_value = "Cpu",
        possible_values = &ArgBackend::variants(),
        case_insensitive = true
    )]
    backend: ArgBackend,

    #[structopt(short = "t", long = "threads", default_value = "0")]
    /// Number of CPU threads for the parallel probe (0: one per core)
    threads: usize,

    #[structopt(long = "work-group-size", default_value = "256")]
    /// Number of co-scheduled units of work in the parallel probe
    work_group_size: usize,

    #[structopt(short = "i", long = "device-id", default_value = "0")]
    /// Execute on GPU (See CUDA device list)
    device_id: u32,
}

fn secs(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000_000.0
}

fn build_backend(config: &RunConfig) -> Result<Box<dyn ComputeBackend>> {
    let backend: Box<dyn ComputeBackend> = match config.backend {
        ArgBackend::Cpu => Box::new(
            CpuReferenceBackendBuilder::default()
                .threads(config.threads)
                .work_group_size(config.work_group_size)
                .build()?,
        ),
        ArgBackend::Cuda => cuda_backend(config)?,
    };

    Ok(backend)
}

#[cfg(feature = "cuda")]
fn cuda_backend(config: &RunConfig) -> Result<Box<dyn ComputeBackend>> {
    use sql_ops::join::cuda_probe::CudaBackendBuilder;

    let backend = CudaBackendBuilder::default()
        .device_id(config.device_id)
        .work_group_size(config.work_group_size)
        .build()?;
    println!("Using CUDA device: {}\n", backend.device_name());

    Ok(Box::new(backend))
}

#[cfg(not(feature = "cuda"))]
fn cuda_backend(_config: &RunConfig) -> Result<Box<dyn ComputeBackend>> {
    use crate::error::ErrorKind;

    Err(ErrorKind::InvalidArgument(
        "The CUDA backend requires building with the `cuda` feature".to_string(),
    )
    .into())
}

/// Checks both results against the reference and against each other.
fn verify(paths: &DataSetPaths, reference_optional: bool) -> Result<()> {
    let results = [
        paths.result(ProbeMethod::Parallel),
        paths.result(ProbeMethod::Sequential),
    ];

    if reference_optional && !paths.reference.is_file() {
        println!(
            ">>> No reference table stored at '{}', skipping verification against it.\n",
            paths.reference.display()
        );
    } else {
        for result in results.iter() {
            check(result, &paths.reference)?;
        }
    }

    check(results[0], results[1])?;

    Ok(())
}

fn check(result: &Path, reference: &Path) -> Result<()> {
    println!(
        ">>> Table stored at '{}' currently being verified\n    using table stored at '{}'.",
        result.display(),
        reference.display()
    );
    compare::compare_files(result, reference)?;
    println!("    Tables are identical.\n");

    Ok(())
}
