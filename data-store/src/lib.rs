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

//! # The Table Store
//!
//! In-memory tables for the customer/purchases equijoin, together with their
//! CSV input and output.
//!
//! - [`tables`] defines the row types and the `Table` container.
//! - [`table_reader`] loads the customer and purchases tables.
//! - [`table_writer`] serializes tables, dropping joined sentinel rows.
//! - [`compare`] verifies that two serialized join results are identical.

pub mod compare;
pub mod error;
pub mod table_reader;
pub mod table_writer;
pub mod tables;
