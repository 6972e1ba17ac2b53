//! # Reserve California
//!
//! Client for the UseDirect grid search endpoint behind ReserveCalifornia.
//! A grid search returns every unit of a facility with one slice per date.

mod client;
pub use client::*;

mod types;
pub use types::*;
