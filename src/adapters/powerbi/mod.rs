//! Power BI export API integration
//!
//! - [`service`] - the [`ExportService`] trait jobs run against
//! - [`models`] - wire response shapes
//! - [`client`] - the `reqwest` implementation

pub mod client;
pub mod models;
pub mod service;

pub use client::PowerBiClient;
pub use service::{ArtifactStream, ExportService, PollStatus, StatusReport, SubmitReceipt};
