//! Open Supply Hub API access
//!
//! - [`HttpTransport`]: the reqwest implementation of the core `Transport`
//!   port (token header, JSON decoding, absolute pagination links)
//! - [`OshClient`]: the facade combining reference data, search, facility
//!   lifecycle reports and the core match engine
//! - [`FacilityQuery`]: search filters for `GET /api/facilities/`

pub mod client;
pub mod normalize;
pub mod query;
pub mod stats;
pub mod transport;

pub use client::{OshClient, OshClientBuilder};
pub use query::FacilityQuery;
pub use stats::CallStats;
pub use transport::HttpTransport;
