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

//! Verifies that two serialized join results are identical.
//!
//! Equality is positional. Line `k` of one input must equal line `k` of the
//! other field by field, and both inputs must have the same number of lines.
//! The header line is compared like any other line. Row order is significant,
//! because it encodes which purchase a joined row belongs to.

use crate::error::{csv_error, io_error, ErrorKind, Result};
use crate::tables::JOINED_ROW_FIELDS;
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Compares two result files.
pub fn compare_files<P, Q>(left: P, right: Q) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let left = left.as_ref();
    let right = right.as_ref();

    let left_file = File::open(left).map_err(|e| io_error(left.display(), e))?;
    let right_file = File::open(right).map_err(|e| io_error(right.display(), e))?;

    compare_readers(
        left_file,
        &left.display().to_string(),
        right_file,
        &right.display().to_string(),
    )
}

/// Compares two serialized results.
///
/// The names are used in the error message that describes the first
/// difference.
pub fn compare_readers<L, R>(left: L, left_name: &str, right: R, right_name: &str) -> Result<()>
where
    L: Read,
    R: Read,
{
    let mut spec = ReaderBuilder::new();
    spec.delimiter(b',').has_headers(false).flexible(true);

    let mut left_reader = spec.from_reader(left);
    let mut right_reader = spec.from_reader(right);
    let mut left_record = StringRecord::new();
    let mut right_record = StringRecord::new();

    let mut line: u64 = 0;
    loop {
        line += 1;

        let has_left = left_reader
            .read_record(&mut left_record)
            .map_err(|e| csv_error(left_name, e))?;
        let has_right = right_reader
            .read_record(&mut right_record)
            .map_err(|e| csv_error(right_name, e))?;

        match (has_left, has_right) {
            (false, false) => break,
            (true, false) => {
                return Err(mismatch(
                    left_name,
                    right_name,
                    line,
                    format!("line is missing in {}", right_name),
                ))
            }
            (false, true) => {
                return Err(mismatch(
                    left_name,
                    right_name,
                    line,
                    format!("line is missing in {}", left_name),
                ))
            }
            (true, true) => {}
        }

        check_width(&left_record, left_name, line)?;
        check_width(&right_record, right_name, line)?;

        if let Some((field, (l, r))) = left_record
            .iter()
            .zip(right_record.iter())
            .enumerate()
            .find(|(_, (l, r))| l != r)
        {
            return Err(mismatch(
                left_name,
                right_name,
                line,
                format!("field {} differs: '{}' != '{}'", field + 1, l, r),
            ));
        }
    }

    debug!(
        left = left_name,
        right = right_name,
        lines = line - 1,
        "Results are identical"
    );

    Ok(())
}

fn check_width(record: &StringRecord, name: &str, line: u64) -> Result<()> {
    if record.len() != JOINED_ROW_FIELDS {
        Err(ErrorKind::ConsistencyError(format!(
            "{}: line {}: expected {} fields, found {}",
            name,
            line,
            JOINED_ROW_FIELDS,
            record.len()
        )))?;
    }

    Ok(())
}

fn mismatch(left: &str, right: &str, line: u64, detail: String) -> crate::error::Error {
    ErrorKind::ConsistencyError(format!(
        "{} and {} differ at line {}: {}",
        left, right, line, detail
    ))
    .into()
}
