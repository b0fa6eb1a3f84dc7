//! Wire representation of resource snapshots.
//!
//! Every field the producer may omit is an `Option`, so validation happens in
//! one place, during conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resource snapshot as received from the resource service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMessage {
    /// Unique resource name.
    pub name: Option<String>,
    /// Kind of resource (e.g. "Project", "Container").
    pub resource_type: Option<String>,
    /// Name shown to users.
    pub display_name: Option<String>,
    /// Stable identifier.
    pub uid: Option<String>,
    /// When the resource was created.
    pub created_at: Option<DateTime<Utc>>,
    /// Arbitrary properties.
    #[serde(default)]
    pub properties: Vec<ResourceProperty>,
    /// Environment variables.
    #[serde(default)]
    pub environment: Vec<EnvironmentVariable>,
    /// Endpoints exposed by the resource.
    #[serde(default)]
    pub urls: Vec<ResourceUrl>,
    /// Free-form state text.
    pub state: Option<String>,
    /// Style hint for the state.
    pub state_style: Option<String>,
    /// Commands the resource supports.
    #[serde(default)]
    pub commands: Vec<ResourceCommand>,
}

/// A named property value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceProperty {
    /// Property name.
    pub name: Option<String>,
    /// Property value.
    pub value: Option<serde_json::Value>,
}

/// An environment variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    /// Variable name.
    pub name: String,
    /// Variable value, absent when unset.
    pub value: Option<String>,
    /// Whether the variable was declared by the resource definition.
    #[serde(default)]
    pub is_from_spec: bool,
}

/// An endpoint URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUrl {
    /// Endpoint name.
    pub name: String,
    /// The URL as sent by the producer. May be malformed.
    pub full_url: String,
    /// Whether the endpoint is only reachable internally.
    #[serde(default)]
    pub is_internal: bool,
}

/// A command offered by a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceCommand {
    /// Command type identifier.
    pub command_type: String,
    /// Name shown to users.
    pub display_name: String,
    /// Message to confirm before running.
    pub confirmation_message: Option<String>,
    /// Opaque parameter passed back when the command runs.
    pub parameter: Option<serde_json::Value>,
}

/// Outcome kind of a resource command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCommandResponseKind {
    /// Not set by the producer.
    #[default]
    Undefined,
    /// The command succeeded.
    Succeeded,
    /// The command failed.
    Failed,
    /// The command was cancelled.
    Cancelled,
}

/// Response to running a resource command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCommandResponse {
    /// Error text when the command failed.
    pub error_message: Option<String>,
    /// Outcome kind.
    #[serde(default)]
    pub kind: ResourceCommandResponseKind,
}
