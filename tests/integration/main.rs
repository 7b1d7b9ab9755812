//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the mock radio. All tests run on the host with no real
//! hardware required.

mod advertising_flow_tests;
mod lifecycle_tests;
mod mock_radio;
