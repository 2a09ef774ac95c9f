//! Tests for the execution core
//!
//! Organized by feature area

mod catch_tests;
mod helpers;
mod if_tests;
mod loop_tests;
mod process_tests;
mod when_tests;
