//! Subcommand implementations.
//!
//! Results are printed to stdout; logs go to stderr.

#![allow(clippy::print_stdout)]

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod wishlist;
