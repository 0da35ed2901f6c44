/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2019-2021 Clemens Lutz
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

use super::data_point::DataPoint;
use super::equijoin_bench::EquiJoinPoint;
use crate::error::Result;
use std::path::PathBuf;
use tracing::info;

/// Runs `func` once for warm-up and then `repeat` more times.
///
/// `func` receives `true` on the warm-up run and returns one point per probe
/// it executed. The measurements are written to `out_file_name` if given.
pub fn measure<F>(
    name: &str,
    repeat: u32,
    out_file_name: Option<PathBuf>,
    template: DataPoint,
    mut func: F,
) -> Result<()>
where
    F: FnMut(bool) -> Result<Vec<EquiJoinPoint>>,
{
    let measurements = (0..=repeat)
        .zip(std::iter::once(true).chain(std::iter::repeat(false)))
        .map(|(_, warm_up)| {
            func(warm_up).map(|points| {
                points
                    .into_iter()
                    .map(|p| DataPoint {
                        warm_up: Some(warm_up),
                        load_ns: if warm_up { template.load_ns } else { None },
                        probe_method: Some(p.probe_method),
                        backend: p.backend.map(str::to_string),
                        threads: p.backend.and(template.threads),
                        work_group_size: p.backend.and(template.work_group_size),
                        matched_tuples: Some(p.matched_rows),
                        probe_ns: Some(p.probe_ns),
                        ..template.clone()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let measurements: Vec<DataPoint> = measurements.into_iter().flatten().collect();
    info!(benchmark = name, points = measurements.len(), "Finished runs");

    if let Some(ofn) = out_file_name {
        let csv_file = std::fs::File::create(ofn)?;
        let mut csv = csv::Writer::from_writer(csv_file);
        measurements
            .iter()
            .try_for_each(|row| csv.serialize(row))?;
        csv.flush()?;
    }

    Ok(())
}
