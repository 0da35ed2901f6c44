// Copyright 2020-2022 Clemens Lutz
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

use std::collections::TryReserveError;
use std::convert::From;
use std::fmt::Display;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum ErrorKind {
    AllocationError(String),
    ConsistencyError(String),
    CsvError(csv::Error),
    InvalidArgument(String),
    IoError(::std::io::Error),
    MalformedInput(String),
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.kind, f)
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self {
            kind: ErrorKind::CsvError(error),
        }
    }
}

impl From<::std::io::Error> for Error {
    fn from(error: ::std::io::Error) -> Self {
        Self {
            kind: ErrorKind::IoError(error),
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(error: TryReserveError) -> Self {
        Self {
            kind: ErrorKind::AllocationError(error.to_string()),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::AllocationError(ref s) => write!(f, "Allocation error: {}", s),
            ErrorKind::ConsistencyError(ref s) => write!(f, "Consistency error: {}", s),
            ErrorKind::CsvError(ref e) => e.fmt(f),
            ErrorKind::InvalidArgument(ref s) => write!(f, "Invalid argument: {}", s),
            ErrorKind::IoError(ref e) => e.fmt(f),
            ErrorKind::MalformedInput(ref s) => write!(f, "Malformed input: {}", s),
        }
    }
}

/// Attaches the offending resource to an I/O error.
pub(crate) fn io_error<S: Display>(source: S, error: ::std::io::Error) -> Error {
    let message = format!("{}: {}", source, error);
    ErrorKind::IoError(::std::io::Error::new(error.kind(), message)).into()
}

/// Attaches the offending resource to a CSV error.
///
/// I/O failures stay I/O errors, everything else the CSV parser rejects is
/// malformed input.
pub(crate) fn csv_error<S: Display>(source: S, error: csv::Error) -> Error {
    let message = format!("{}: {}", source, error);
    match error.into_kind() {
        csv::ErrorKind::Io(e) => ErrorKind::IoError(::std::io::Error::new(e.kind(), message)).into(),
        _ => ErrorKind::MalformedInput(message).into(),
    }
}
