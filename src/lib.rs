pub mod cart;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod party;
pub mod report;
pub mod service;
pub mod types;
pub mod utils;
pub mod validate;
