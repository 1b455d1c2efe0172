//! # Hermes Client
//!
//! Outbound requests to Hermes (or any REST) services.
//!
//! [`RequestBuilder`] encodes bodies and decodes responses with the same
//! [`MarshallerRegistry`](hermes_extract::MarshallerRegistry) the server
//! uses, over a process-wide pooled `reqwest` client or one you supply.

#![doc(html_root_url = "https://docs.rs/hermes-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod error;

pub use builder::{Reply, RequestBuilder};
pub use error::{ClientError, ClientResult};
