/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2019 German Research Center for Artificial Intelligence (DFKI)
 * Author: Clemens Lutz <clemens.lutz@dfki.de>
 */

//! Data set generators for the customer and purchases tables.
//!
//! The generators follow a uniform distribution. They take the random number
//! generator as an argument, so that a seeded generator yields reproducible
//! tables.

use crate::error::{ErrorKind, Result};

use data_store::tables::{ActiveFlag, CustomerName, CustomerRow, ProductCode, PurchaseRow};

use rand::distributions::{Distribution, Uniform};
use rand::seq::SliceRandom;
use rand::Rng;

use std::convert::TryFrom;
use std::time::{SystemTime, UNIX_EPOCH};

/// First names that customers are drawn from.
///
/// All names fit into `CUSTOMER_NAME_MAX_BYTES`.
const FIRST_NAMES: &[&str] = &[
    "Aaliyah", "Adam", "Alexander", "Alice", "Amelia", "Andrew", "Anna", "Ava", "Benjamin",
    "Carlos", "Charlotte", "Chloe", "Daniel", "David", "Elizabeth", "Emily", "Emma", "Ethan",
    "Evelyn", "Grace", "Hannah", "Henry", "Isabella", "Jack", "Jacob", "James", "Jennifer",
    "John", "Joseph", "Kevin", "Laura", "Liam", "Linda", "Lucas", "Maria", "Mary", "Matthew",
    "Mia", "Michael", "Noah", "Oliver", "Olivia", "Patricia", "Robert", "Samuel", "Sarah",
    "Sophia", "Thomas", "William", "Zoe",
];

/// Smallest gap between two consecutive purchases in nanoseconds.
pub const MIN_NS_GAP: u64 = 1;

/// Largest gap between two consecutive purchases in nanoseconds.
pub const MAX_NS_GAP: u64 = 2000;

/// Largest quantity of a purchase.
pub const MAX_QUANTITY: u64 = 9999;

/// Generator for the customer table.
pub struct CustomerRelation;

impl CustomerRelation {
    /// Generates customers with dense ids.
    ///
    /// The ids are contiguous, start from 1, and follow the slice order. Names
    /// and active flags are random.
    pub fn gen<R: Rng>(rows: &mut [CustomerRow], rng: &mut R) -> Result<()> {
        rows.iter_mut()
            .zip(1_u64..)
            .try_for_each(|(row, id)| -> Result<()> {
                let name = FIRST_NAMES
                    .choose(rng)
                    .and_then(|name| CustomerName::new(name))
                    .ok_or_else(|| ErrorKind::Msg("Failed to pick a customer name".to_string()))?;
                let active = if rng.gen::<bool>() {
                    ActiveFlag::Active
                } else {
                    ActiveFlag::Inactive
                };

                *row = CustomerRow { id, name, active };
                Ok(())
            })
    }
}

/// Generator for the purchases table.
pub struct PurchasesRelation;

impl PurchasesRelation {
    /// Generates purchases of `customers` customers.
    ///
    /// Timestamps start at `start_timestamp` and increase by a random gap of
    /// `MIN_NS_GAP` to `MAX_NS_GAP` nanoseconds. Customer ids are uniformly
    /// distributed over `1..=customers`. Product codes are valid EAN-13 codes.
    pub fn gen<R: Rng>(
        rows: &mut [PurchaseRow],
        customers: usize,
        start_timestamp: u64,
        rng: &mut R,
    ) -> Result<()> {
        if customers == 0 {
            Err(ErrorKind::InvalidArgument(
                "Purchases require at least one customer".to_string(),
            ))?;
        }

        let max_customer_id = u64::try_from(customers).map_err(|_| {
            ErrorKind::IntegerOverflow("Failed to convert from usize".to_string())
        })?;
        let customer_ids = Uniform::from(1..=max_customer_id);
        let gaps = Uniform::from(MIN_NS_GAP..=MAX_NS_GAP);
        let quantities = Uniform::from(1..=MAX_QUANTITY);

        let mut timestamp = start_timestamp;
        rows.iter_mut().try_for_each(|row| -> Result<()> {
            *row = PurchaseRow {
                timestamp,
                customer_id: customer_ids.sample(rng),
                product_code: gen_ean13(rng),
                quantity: quantities.sample(rng),
            };

            timestamp = timestamp.checked_add(gaps.sample(rng)).ok_or_else(|| {
                ErrorKind::IntegerOverflow("Purchase timestamp overflowed".to_string())
            })?;
            Ok(())
        })
    }
}

/// Returns the current time in nanoseconds since the Unix epoch.
pub fn now_ns() -> Result<u64> {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| ErrorKind::Msg("System time is before the Unix epoch".to_string()))?;

    u64::try_from(since_epoch.as_nanos())
        .map_err(|_| ErrorKind::IntegerOverflow("Timestamp exceeds 64 bits".to_string()).into())
}

/// Computes the EAN-13 check digit of the first twelve digits.
///
/// Digits at odd positions (counting from one) have weight 1, digits at even
/// positions have weight 3.
pub fn ean13_check_digit(digits: &[u8; 12]) -> u8 {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * if i % 2 == 0 { 1 } else { 3 })
        .sum();

    ((10 - sum % 10) % 10) as u8
}

/// Generates a random, valid EAN-13 product code.
pub fn gen_ean13<R: Rng>(rng: &mut R) -> ProductCode {
    let digit = Uniform::from(0_u8..=9);
    let mut digits = [0_u8; 12];
    digits.iter_mut().for_each(|d| *d = digit.sample(rng));
    let check = ean13_check_digit(&digits);

    let mut code = [0_u8; 13];
    code.iter_mut()
        .zip(digits.iter().chain(std::iter::once(&check)))
        .for_each(|(c, d)| *c = b'0' + d);

    // The code consists of ASCII digits only.
    std::str::from_utf8(&code)
        .ok()
        .and_then(ProductCode::new)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::error::Error;

    #[test]
    fn customer_ids_are_dense() -> std::result::Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut rows = vec![CustomerRow::default(); 100];
        CustomerRelation::gen(&mut rows, &mut rng)?;

        rows.iter()
            .zip(1..)
            .for_each(|(row, id)| assert_eq!(row.id, id));
        assert!(rows.iter().all(|row| !row.name.is_empty()));

        Ok(())
    }

    #[test]
    fn purchases_reference_existing_customers() -> std::result::Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut rows = vec![PurchaseRow::default(); 1000];
        PurchasesRelation::gen(&mut rows, 10, 1_000_000, &mut rng)?;

        assert_eq!(rows[0].timestamp, 1_000_000);
        for pair in rows.windows(2) {
            let gap = pair[1].timestamp - pair[0].timestamp;
            assert!(gap >= MIN_NS_GAP && gap <= MAX_NS_GAP);
        }

        for row in &rows {
            assert!(row.customer_id >= 1 && row.customer_id <= 10);
            assert!(row.quantity >= 1 && row.quantity <= MAX_QUANTITY);
            assert_eq!(row.product_code.len(), 13);
        }

        Ok(())
    }

    #[test]
    fn purchases_without_customers_are_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut rows = vec![PurchaseRow::default(); 1];
        let result = PurchasesRelation::gen(&mut rows, 0, 0, &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn same_seed_yields_same_tables() -> std::result::Result<(), Box<dyn Error>> {
        let mut first = vec![CustomerRow::default(); 50];
        let mut second = vec![CustomerRow::default(); 50];
        CustomerRelation::gen(&mut first, &mut StdRng::seed_from_u64(7))?;
        CustomerRelation::gen(&mut second, &mut StdRng::seed_from_u64(7))?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn known_ean13_check_digits() {
        // 4006381333931
        assert_eq!(ean13_check_digit(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3]), 1);
        // 5901234123457
        assert_eq!(ean13_check_digit(&[5, 9, 0, 1, 2, 3, 4, 1, 2, 3, 4, 5]), 7);
    }

    #[test]
    fn generated_ean13_codes_are_valid() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let code = gen_ean13(&mut rng);
            let digits: Vec<u8> = code.as_str().bytes().map(|b| b - b'0').collect();
            assert_eq!(digits.len(), 13);

            let mut prefix = [0_u8; 12];
            prefix.copy_from_slice(&digits[..12]);
            assert_eq!(ean13_check_digit(&prefix), digits[12]);
        }
    }
}
