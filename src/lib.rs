//! Listing Wizard — conversational collection flows for marketplace
//! listings (companies, job postings, gigs).

pub mod config;
pub mod enrichment;
pub mod error;
pub mod marketplace;
pub mod persist;
pub mod typing;
pub mod wizard;
