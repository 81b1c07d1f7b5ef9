pub mod client;
pub mod envelope;
pub mod request;

pub use client::{ApiClient, RawResponse};
pub use envelope::{Envelope, ErrorBody, Payload};
pub use request::ApiRequest;
