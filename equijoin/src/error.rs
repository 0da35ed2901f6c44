/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright (c) 2019, Clemens Lutz <lutzcle@cml.li>
 * Author: Clemens Lutz <clemens.lutz@dfki.de>
 */

use data_store::error::Error as DataStoreError;
use error_chain::error_chain;
use sql_ops::error::Error as SqlOpsError;

error_chain! {
    errors {
        InvalidArgument(msg: String) {
            description("Invalid argument error")
            display("Aborted with: {}", msg)
        }
    }

    foreign_links {
        Csv(csv::Error);
        DataStore(DataStoreError);
        Io(::std::io::Error);
        SqlOps(SqlOpsError);
    }
}
