//! API interaction module
//!
//! This module provides the request dispatcher and everything it needs to talk
//! to the server: the HTTP transport, the response envelopes, and the
//! pagination aggregator built on top of single-call dispatch.
//!
//! # Module Structure
//!
//! - [`client`] - Dispatcher: route resolution, body encoding, envelope decoding
//! - [`envelope`] - Single, multi, count, async-accepted and error envelopes
//! - [`http`] - Bearer-authenticated transport with diagnostic recording
//! - [`pager`] - Count-then-paginate `list_all`
//!
//! # Example
//!
//! ```ignore
//! use resclient::{Client, ClientConfig};
//!
//! async fn example(app: &mut App) -> resclient::Result<()> {
//!     let client = Client::new(ClientConfig::new("https://api.example.com/v1", "token"))?;
//!     let receipt = client.create(app).await?;
//!     println!("created, request {}", receipt.request_id);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod envelope;
pub mod http;
mod pager;

pub use client::{Client, Receipt};
pub use envelope::{Envelope, Payload};
pub use http::{Exchange, HttpTransport, RecordedRequest, RecordedResponse};
