//! GoodData-style reporting API integration
//!
//! Two collaborators live here: the [`auth::GoodDataAuthenticator`], which
//! owns the two-tier credential cache, and the [`client::GoodDataClient`],
//! which drives the report execution protocol (element resolution, raw
//! execution, result polling).

pub mod auth;
pub mod client;
pub mod types;

pub use auth::GoodDataAuthenticator;
pub use client::GoodDataClient;
