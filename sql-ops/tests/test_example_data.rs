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

use data_store::compare::compare_readers;
use data_store::table_reader::TableReader;
use data_store::table_writer::write_table;
use data_store::tables::{
    ActiveFlag, CustomerRow, JoinedTable, PurchaseRow, PurchasesTable,
};
use sql_ops::join::parallel_probe::CpuReferenceBackendBuilder;
use sql_ops::join::{HashIndex, ParallelProbeDispatcher, Polarity, SequentialProbe};
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::result::Result;

const HEADER: &str = "timestamp,customer_id,customer_name,product_code,quantity\n";

fn data_path(file: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("..");
    path.push("data");
    path.push(file);
    path
}

fn serialize(table: &JoinedTable) -> Result<String, Box<dyn Error>> {
    let mut out = Vec::new();
    write_table(table, &mut out, "memory")?;
    Ok(String::from_utf8(out)?)
}

fn load_example() -> Result<(HashIndex, PurchasesTable), Box<dyn Error>> {
    let reader = TableReader::default();
    let index =
        HashIndex::from_rows(reader.customers_from_path(data_path("example_customer_data.csv"))?)?;
    let purchases = reader.load_purchases(data_path("example_purchases_data.csv"))?;
    Ok((index, purchases))
}

fn run_example(polarity: Polarity, reference: &str) -> Result<(), Box<dyn Error>> {
    let (index, purchases) = load_example()?;

    let dispatcher =
        ParallelProbeDispatcher::new(CpuReferenceBackendBuilder::default().threads(2).build()?);
    let parallel = serialize(&dispatcher.dispatch(&index, &purchases, polarity)?)?;
    let sequential = serialize(&SequentialProbe::probe(&index, &purchases, polarity)?)?;

    let reference_path = data_path(reference);
    let reference_name = reference_path.display().to_string();

    compare_readers(
        parallel.as_bytes(),
        "parallel",
        File::open(&reference_path)?,
        &reference_name,
    )?;
    compare_readers(
        sequential.as_bytes(),
        "sequential",
        File::open(&reference_path)?,
        &reference_name,
    )?;

    // The writer reproduces the reference byte for byte
    assert_eq!(sequential, std::fs::read_to_string(&reference_path)?);

    Ok(())
}

#[test]
fn example_data_active_customers() -> Result<(), Box<dyn Error>> {
    run_example(
        Polarity::Active,
        "example_results/example_correct_join_result_active_customers.csv",
    )
}

#[test]
fn example_data_inactive_customers() -> Result<(), Box<dyn Error>> {
    run_example(
        Polarity::Inactive,
        "example_results/example_correct_join_result_inactive_customers.csv",
    )
}

#[test]
fn example_data_index_is_dense() -> Result<(), Box<dyn Error>> {
    let (index, purchases) = load_example()?;
    assert_eq!(index.len(), 12);
    assert_eq!(purchases.len(), 30);
    Ok(())
}

fn two_customers() -> Result<HashIndex, Box<dyn Error>> {
    Ok(HashIndex::from_rows(vec![
        CustomerRow::new(1, "James", ActiveFlag::Inactive),
        CustomerRow::new(2, "Mary", ActiveFlag::Active),
    ])?)
}

#[test]
fn mary_matches_active_polarity() -> Result<(), Box<dyn Error>> {
    let index = two_customers()?;
    let purchases =
        PurchasesTable::from_rows(vec![PurchaseRow::new(100, 2, "1111111111111", 3)?]);

    let joined = SequentialProbe::probe(&index, &purchases, Polarity::Active)?;
    assert_eq!(
        serialize(&joined)?,
        format!("{}100,2,\"Mary\",\"1111111111111\",3\n", HEADER)
    );

    Ok(())
}

#[test]
fn mary_is_filtered_by_inactive_polarity() -> Result<(), Box<dyn Error>> {
    let index = two_customers()?;
    let purchases =
        PurchasesTable::from_rows(vec![PurchaseRow::new(100, 2, "1111111111111", 3)?]);

    let joined = SequentialProbe::probe(&index, &purchases, Polarity::Inactive)?;
    assert_eq!(joined.len(), 1);
    assert_eq!(serialize(&joined)?, HEADER);

    Ok(())
}

#[test]
fn disagreeing_customer_shortens_output_by_one_line() -> Result<(), Box<dyn Error>> {
    let index = two_customers()?;
    let purchases = PurchasesTable::from_rows(vec![
        PurchaseRow::new(100, 2, "1111111111111", 3)?,
        PurchaseRow::new(101, 1, "2222222222222", 1)?,
        PurchaseRow::new(102, 2, "3333333333333", 2)?,
    ]);

    let joined = SequentialProbe::probe(&index, &purchases, Polarity::Active)?;
    let csv = serialize(&joined)?;

    assert_eq!(csv.lines().count(), 1 + purchases.len() - 1);
    assert!(csv.lines().all(|line| !line.starts_with("101,")));
    assert!(csv.lines().all(|line| line.split(',').count() == 5));

    Ok(())
}

#[test]
fn differing_results_are_inconsistent() -> Result<(), Box<dyn Error>> {
    let index = two_customers()?;
    let purchases =
        PurchasesTable::from_rows(vec![PurchaseRow::new(100, 2, "1111111111111", 3)?]);

    let active = serialize(&SequentialProbe::probe(&index, &purchases, Polarity::Active)?)?;
    let inactive = serialize(&SequentialProbe::probe(&index, &purchases, Polarity::Inactive)?)?;

    let result = compare_readers(active.as_bytes(), "active", inactive.as_bytes(), "inactive");
    assert!(result.is_err());

    Ok(())
}
