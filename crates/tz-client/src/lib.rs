//! Client for the TensorZero gateway.
//!
//! [`GatewayClient`] covers inference (single-shot and streamed), feedback and dataset
//! datapoints. Streamed inferences are decoded by [`InferenceStream`].
//!
//! # Quick Start
//!
//! ```no_run
//! use futures::StreamExt;
//! use tz_client::GatewayClient;
//! use tz_types::{Input, InputMessage, InferenceRequest, Role};
//!
//! # async fn example() -> Result<(), tz_types::GatewayError> {
//! let client = GatewayClient::from_env()?;
//! let input = Input { system: None, messages: vec![InputMessage::text(Role::User, "Write a haiku")] };
//!
//! let response = client.infer_once(InferenceRequest::for_function("write_haiku", input.clone())).await?;
//! println!("{}", response.inference_id());
//!
//! let mut stream = client.infer_stream(InferenceRequest::for_function("write_haiku", input)).await?;
//! while let Some(chunk) = stream.next().await {
//!     println!("{:?}", chunk?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod gateway;
pub mod sse;

pub use gateway::{DEFAULT_GATEWAY_URL, GATEWAY_URL_ENV, GatewayClient};
pub use sse::{DONE_SENTINEL, InferenceStream, encode_done, encode_event};
