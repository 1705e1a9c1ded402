//! `adya-cli`: the workload generator, fault-injection hook, DB connection
//! shim, and command-line surface built on top of `adya-core`.
//!
//! Everything in this crate is an external collaborator around the hard
//! core: history model, dependency extraction, DSG, and anomaly taxonomy
//! live entirely in `adya-core`, which never calls back into this crate.

pub mod command;
pub mod config;
pub mod db;
pub mod generator;
pub mod nemesis;
pub mod trace;
