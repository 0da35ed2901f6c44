/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright (c) 2019, Clemens Lutz <lutzcle@cml.li>
 * Author: Clemens Lutz <clemens.lutz@dfki.de>
 */

use super::equijoin_bench::EquiJoinBench;
use crate::config::RunConfig;
use crate::error::Result;
use crate::types::*;
use serde_derive::Serialize;
use std::time::Duration;

#[derive(Clone, Debug, Default, Serialize)]
pub struct DataPoint {
    pub data_set: Option<String>,
    pub hostname: String,
    pub polarity: Option<ArgPolarity>,
    pub probe_method: Option<ProbeMethod>,
    pub backend: Option<String>,
    pub threads: Option<usize>,
    pub work_group_size: Option<usize>,
    pub device_id: Option<u32>,
    pub customer_tuples: Option<usize>,
    pub purchase_tuples: Option<usize>,
    pub matched_tuples: Option<usize>,
    pub warm_up: Option<bool>,
    pub load_ns: Option<f64>,
    pub probe_ns: Option<f64>,
}

impl DataPoint {
    pub fn new() -> Result<DataPoint> {
        let hostname = hostname::get_hostname().ok_or_else(|| "Couldn't get hostname")?;

        let dp = DataPoint {
            hostname,
            ..DataPoint::default()
        };

        Ok(dp)
    }

    pub fn fill_from_run_config(&self, config: &RunConfig) -> DataPoint {
        DataPoint {
            data_set: Some(config.data_set.to_string()),
            polarity: Some(config.arg_polarity),
            threads: if config.backend == ArgBackend::Cpu {
                Some(config.threads)
            } else {
                None
            },
            work_group_size: Some(config.work_group_size),
            device_id: if config.backend == ArgBackend::Cuda {
                Some(config.device_id)
            } else {
                None
            },
            ..self.clone()
        }
    }

    pub fn fill_from_equijoin_bench(&self, bench: &EquiJoinBench) -> DataPoint {
        DataPoint {
            customer_tuples: Some(bench.index.len()),
            purchase_tuples: Some(bench.purchases.len()),
            ..self.clone()
        }
    }

    pub fn set_load_time(&self, load: Duration) -> DataPoint {
        DataPoint {
            load_ns: Some(load.as_nanos() as f64),
            ..self.clone()
        }
    }
}
