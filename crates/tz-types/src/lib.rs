//! Contract model for the TensorZero gateway and fine-tuning providers.
//!
//! This crate defines the request, response and entity shapes exchanged with the gateway,
//! plus the error type every gateway operation returns. It holds no behaviour beyond
//! (de)serialization and local contract checks.

pub mod datapoint;
pub mod error;
pub mod feedback;
pub mod inference;
pub mod input;
pub mod row;

pub use datapoint::{
    ChatInferenceDatapoint, CreateDatapointRequest, Datapoint, DatapointOutputKind,
    DatapointResponse, JsonInferenceDatapoint,
};
pub use error::{GatewayError, GatewayResult};
pub use feedback::{FeedbackRequest, FeedbackResponse};
pub use inference::{
    ChatInferenceResponse, ContentBlockOutput, InferenceParams, InferenceRequest,
    InferenceResponse, JsonInferenceResponse, JsonOutput, Tool, ToolCallOutput, ToolChoice, Usage,
};
pub use input::{Input, InputMessage, InputMessageContent, Role, ToolCall, ToolResult};
pub use row::{InferenceOutput, JsonInferenceOutput, ParsedInferenceRow};
