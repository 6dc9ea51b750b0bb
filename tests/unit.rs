//! Integration test driver: pulls in the `tests/unit/` modules.
//!
//! Everything here runs against [`hive_vpcd::ovn::mock::MockOvnClient`]
//! rather than a live OVN deployment.

mod unit;
