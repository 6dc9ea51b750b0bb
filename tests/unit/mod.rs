//! Unit/scenario test modules.

mod multi_subnet_scenario;
