/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2019 German Research Center for Artificial Intelligence (DFKI)
 * Author: Clemens Lutz <clemens.lutz@dfki.de>
 */

//! The configuration of one equijoin run, resolved from the command line.

use crate::error::{ErrorKind, Result};
use crate::types::*;
use crate::CmdOpt;
use sql_ops::join::Polarity;
use std::path::{Path, PathBuf};

/// Input, output, and reference files of a data set.
#[derive(Clone, Debug, PartialEq)]
pub struct DataSetPaths {
    pub customers: PathBuf,
    pub purchases: PathBuf,
    pub reference: PathBuf,
    pub parallel_result: PathBuf,
    pub serial_result: PathBuf,
}

impl DataSetPaths {
    /// Derives the default file names of a data set in `data_dir`.
    ///
    /// Results and the reference live in the data set's `*_results`
    /// directory.
    pub fn new(data_dir: &Path, data_set: ArgDataSet, polarity: Polarity) -> Self {
        let prefix = data_set.file_prefix();
        let results_dir = data_dir.join(format!("{}_results", prefix));
        let result_name = |method: &str| {
            results_dir.join(format!(
                "{}_{}_join_result_{}_customers.csv",
                method, prefix, polarity
            ))
        };

        Self {
            customers: data_dir.join(format!("{}_customer_data.csv", prefix)),
            purchases: data_dir.join(format!("{}_purchases_data.csv", prefix)),
            reference: results_dir.join(format!(
                "{}_correct_join_result_{}_customers.csv",
                prefix, polarity
            )),
            parallel_result: result_name(ProbeMethod::Parallel.file_prefix()),
            serial_result: result_name(ProbeMethod::Sequential.file_prefix()),
        }
    }

    pub fn result(&self, method: ProbeMethod) -> &Path {
        match method {
            ProbeMethod::Parallel => &self.parallel_result,
            ProbeMethod::Sequential => &self.serial_result,
        }
    }
}

/// Everything an equijoin run needs to know.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub data_set: ArgDataSet,
    pub polarity: Polarity,
    pub arg_polarity: ArgPolarity,
    pub paths: DataSetPaths,
    /// Verify against the reference result only if it exists.
    pub reference_optional: bool,
    pub backend: ArgBackend,
    pub threads: usize,
    pub work_group_size: usize,
    pub device_id: u32,
    pub repeat: u32,
    pub csv: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_cmd(cmd: &CmdOpt) -> Result<Self> {
        if cmd.work_group_size == 0 || cmd.work_group_size > sql_ops::MAX_WORK_GROUP_SIZE {
            Err(ErrorKind::InvalidArgument(format!(
                "--work-group-size must be between 1 and {}",
                sql_ops::MAX_WORK_GROUP_SIZE
            )))?;
        }

        let polarity: Polarity = cmd.polarity.into();
        let mut paths = DataSetPaths::new(&cmd.data_dir, cmd.data_set, polarity);

        if let Some(ref customers) = cmd.customers {
            paths.customers = customers.clone();
        }
        if let Some(ref purchases) = cmd.purchases {
            paths.purchases = purchases.clone();
        }
        if let Some(ref reference) = cmd.reference {
            paths.reference = reference.clone();
        }

        Ok(Self {
            data_set: cmd.data_set,
            polarity,
            arg_polarity: cmd.polarity,
            paths,
            reference_optional: cmd.reference.is_none(),
            backend: cmd.backend,
            threads: cmd.threads,
            work_group_size: cmd.work_group_size,
            device_id: cmd.device_id,
            repeat: cmd.repeat,
            csv: cmd.csv.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DataSetPaths;
    use crate::types::{ArgDataSet, ProbeMethod};
    use sql_ops::join::Polarity;
    use std::path::Path;

    #[test]
    fn example_active_paths() {
        let paths = DataSetPaths::new(Path::new("./data"), ArgDataSet::Example, Polarity::Active);

        assert_eq!(paths.customers, Path::new("./data/example_customer_data.csv"));
        assert_eq!(paths.purchases, Path::new("./data/example_purchases_data.csv"));
        assert_eq!(
            paths.reference,
            Path::new(
                "./data/example_results/example_correct_join_result_active_customers.csv"
            )
        );
        assert_eq!(
            paths.result(ProbeMethod::Parallel),
            Path::new(
                "./data/example_results/parallel_example_join_result_active_customers.csv"
            )
        );
        assert_eq!(
            paths.result(ProbeMethod::Sequential),
            Path::new("./data/example_results/serial_example_join_result_active_customers.csv")
        );
    }

    #[test]
    fn custom_inactive_paths() {
        let paths = DataSetPaths::new(Path::new("/tmp/d"), ArgDataSet::Custom, Polarity::Inactive);

        assert_eq!(paths.customers, Path::new("/tmp/d/custom_customer_data.csv"));
        assert_eq!(paths.purchases, Path::new("/tmp/d/custom_purchases_data.csv"));
        assert_eq!(
            paths.serial_result,
            Path::new("/tmp/d/custom_results/serial_custom_join_result_inactive_customers.csv")
        );
        assert_eq!(
            paths.reference,
            Path::new("/tmp/d/custom_results/custom_correct_join_result_inactive_customers.csv")
        );
    }

    #[test]
    fn default_paths_name_the_shipped_example_files() {
        let data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../data");

        for &polarity in &[Polarity::Active, Polarity::Inactive] {
            let paths = DataSetPaths::new(&data_dir, ArgDataSet::Example, polarity);
            assert!(paths.customers.is_file(), "{}", paths.customers.display());
            assert!(paths.purchases.is_file(), "{}", paths.purchases.display());
            assert!(paths.reference.is_file(), "{}", paths.reference.display());
        }
    }
}
