//! Core business logic for Trustbook.
//!
//! This crate contains pure trust accounting logic with ZERO web or database
//! dependencies. All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `trust` - IOLTA trust ledger: postings, transfers, voids, reconciliation, statements

pub mod trust;
