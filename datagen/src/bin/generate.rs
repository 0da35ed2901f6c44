/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2019 German Research Center for Artificial Intelligence (DFKI)
 * Author: Clemens Lutz <clemens.lutz@dfki.de>
 */

use data_store::table_writer;
use data_store::tables::{CustomerRow, CustomerTable, PurchaseRow, PurchasesTable};
use datagen::relation::{self, CustomerRelation, PurchasesRelation};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse commandline arguments
    let cmd = CmdOpt::from_args();

    let mut rng = match cmd.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!(
        "Generating customer table with {} random records and purchases table with {} random records; this may take some time",
        cmd.customers, cmd.purchases
    );

    let mut customers = vec![CustomerRow::default(); cmd.customers];
    CustomerRelation::gen(&mut customers, &mut rng)?;

    let start_timestamp = match cmd.start_timestamp {
        Some(ts) => ts,
        None => relation::now_ns()?,
    };
    let mut purchases = vec![PurchaseRow::default(); cmd.purchases];
    PurchasesRelation::gen(&mut purchases, cmd.customers, start_timestamp, &mut rng)?;

    table_writer::write_table_to_path(&CustomerTable::from_rows(customers), &cmd.customer_path)?;
    table_writer::write_table_to_path(&PurchasesTable::from_rows(purchases), &cmd.purchases_path)?;

    Ok(())
}

#[derive(StructOpt)]
#[structopt(
    name = "generate",
    about = "Generates customer and purchases tables for the equijoin"
)]
struct CmdOpt {
    /// Customer table output file
    #[structopt(
        parse(from_os_str),
        default_value = "./data/custom_customer_data.csv"
    )]
    customer_path: PathBuf,

    /// Purchases table output file
    #[structopt(
        parse(from_os_str),
        default_value = "./data/custom_purchases_data.csv"
    )]
    purchases_path: PathBuf,

    /// Customer table size (rows)
    #[structopt(long = "customers", default_value = "1000")]
    customers: usize,

    /// Purchases table size (rows)
    #[structopt(long = "purchases", default_value = "100000")]
    purchases: usize,

    /// Seed for the random number generator (default: random)
    #[structopt(long = "seed")]
    seed: Option<u64>,

    /// Timestamp of the first purchase in ns since the Unix epoch (default: now)
    #[structopt(long = "start-timestamp")]
    start_timestamp: Option<u64>,
}
