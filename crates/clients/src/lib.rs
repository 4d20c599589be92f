//! Client value objects.
//!
//! Pure domain data only: personal details, address and the derived
//! verification status the ledger consults before every transaction.

pub mod address;
pub mod client;

pub use address::{Address, AddressBuilder};
pub use client::{Client, ClientBuilder, PassportId};
