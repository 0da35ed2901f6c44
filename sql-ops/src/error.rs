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

use std::collections::TryReserveError;
use std::convert::From;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum ErrorKind {
    AllocationError(String),
    #[cfg(feature = "cuda")]
    CudaError(rustacuda::error::CudaError),
    DataStoreError(data_store::error::Error),
    DeviceError(String),
    IntegerOverflow(String),
    InvalidArgument(String),
    MalformedInput(String),
    RayonThreadPoolBuildError(rayon::ThreadPoolBuildError),
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

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind {
            #[cfg(feature = "cuda")]
            ErrorKind::CudaError(ref e) => Some(e),
            ErrorKind::DataStoreError(ref e) => Some(e),
            ErrorKind::RayonThreadPoolBuildError(ref e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.kind, f)
    }
}

#[cfg(feature = "cuda")]
impl From<rustacuda::error::CudaError> for Error {
    fn from(error: rustacuda::error::CudaError) -> Self {
        Self {
            kind: ErrorKind::CudaError(error),
        }
    }
}

impl From<data_store::error::Error> for Error {
    fn from(error: data_store::error::Error) -> Self {
        Self {
            kind: ErrorKind::DataStoreError(error),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        Self {
            kind: ErrorKind::RayonThreadPoolBuildError(error),
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
            ErrorKind::AllocationError(ref s) => write!(f, "AllocationError: {}", s),
            #[cfg(feature = "cuda")]
            ErrorKind::CudaError(ref e) => e.fmt(f),
            ErrorKind::DataStoreError(ref e) => e.fmt(f),
            ErrorKind::DeviceError(ref s) => write!(f, "DeviceError: {}", s),
            ErrorKind::IntegerOverflow(ref s) => write!(f, "IntegerOverflow: {}", s),
            ErrorKind::InvalidArgument(ref s) => write!(f, "InvalidArgument: {}", s),
            ErrorKind::MalformedInput(ref s) => write!(f, "MalformedInput: {}", s),
            ErrorKind::RayonThreadPoolBuildError(ref e) => e.fmt(f),
        }
    }
}
