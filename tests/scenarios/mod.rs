//! Scenario-based tests for perf-runner

mod catalog;
mod fail_fast;
mod registration;
mod selection;
mod success_chain;
