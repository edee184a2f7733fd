//! Request Client: vend submission and price lookup over HTTP.

mod client;
mod table;

pub use client::{RequestClient, VendApi};
pub use table::{FailureTable, Feedback, PRICE_FAILURES, Rule, VEND_FAILURES};
