/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright (c) 2019, Clemens Lutz <lutzcle@cml.li>
 * Author: Clemens Lutz <clemens.lutz@dfki.de>
 */

use serde_derive::Serialize;
use sql_ops::join::Polarity;
use structopt::clap::arg_enum;

arg_enum! {
    #[derive(Copy, Clone, Debug, PartialEq)]
    pub enum ArgDataSet {
        Example,
        Custom,
    }
}

arg_enum! {
    #[derive(Copy, Clone, Debug, PartialEq, Serialize)]
    pub enum ArgPolarity {
        Active,
        Inactive,
    }
}

arg_enum! {
    #[derive(Copy, Clone, Debug, PartialEq, Serialize)]
    pub enum ArgBackend {
        Cpu,
        Cuda,
    }
}

/// How a probe run executed.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub enum ProbeMethod {
    Parallel,
    Sequential,
}

impl ArgDataSet {
    /// The prefix of the data set's file names.
    pub fn file_prefix(self) -> &'static str {
        match self {
            ArgDataSet::Example => "example",
            ArgDataSet::Custom => "custom",
        }
    }
}

impl ProbeMethod {
    /// The prefix of the result file name.
    pub fn file_prefix(self) -> &'static str {
        match self {
            ProbeMethod::Parallel => "parallel",
            ProbeMethod::Sequential => "serial",
        }
    }
}

impl From<ArgPolarity> for Polarity {
    fn from(polarity: ArgPolarity) -> Self {
        match polarity {
            ArgPolarity::Active => Polarity::Active,
            ArgPolarity::Inactive => Polarity::Inactive,
        }
    }
}
