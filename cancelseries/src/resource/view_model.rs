//! Validated view models.

use super::ResourceCommandResponseKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Resource states with dedicated handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownResourceState {
    /// Ran to completion.
    Finished,
    /// Exited.
    Exited,
    /// Could not be started.
    FailedToStart,
    /// Starting up.
    Starting,
    /// Running.
    Running,
    /// Being built.
    Building,
    /// Hidden from listings.
    Hidden,
}

impl FromStr for KnownResourceState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Finished" => Ok(Self::Finished),
            "Exited" => Ok(Self::Exited),
            "FailedToStart" => Ok(Self::FailedToStart),
            "Starting" => Ok(Self::Starting),
            "Running" => Ok(Self::Running),
            "Building" => Ok(Self::Building),
            "Hidden" => Ok(Self::Hidden),
            _ => Err(()),
        }
    }
}

impl fmt::Display for KnownResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Finished => "Finished",
            Self::Exited => "Exited",
            Self::FailedToStart => "FailedToStart",
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Building => "Building",
            Self::Hidden => "Hidden",
        };
        f.write_str(s)
    }
}

/// An environment variable ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariableViewModel {
    /// Variable name.
    pub name: String,
    /// Variable value.
    pub value: Option<String>,
    /// Whether the variable was declared by the resource definition.
    pub from_spec: bool,
}

/// An endpoint with a parsed, absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlViewModel {
    /// Endpoint name.
    pub name: String,
    /// The parsed URL.
    pub url: url::Url,
    /// Whether the endpoint is only reachable internally.
    pub is_internal: bool,
}

/// A command ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandViewModel {
    /// Command type identifier.
    pub command_type: String,
    /// Name shown to users.
    pub display_name: String,
    /// Message to confirm before running.
    pub confirmation_message: Option<String>,
    /// Opaque parameter passed back when the command runs.
    pub parameter: Option<serde_json::Value>,
}

/// A validated resource snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceViewModel {
    /// Unique resource name.
    pub name: String,
    /// Kind of resource.
    pub resource_type: String,
    /// Name shown to users.
    pub display_name: String,
    /// Stable identifier.
    pub uid: String,
    /// When the resource was created.
    pub creation_timestamp: DateTime<Utc>,
    /// Properties keyed by name.
    pub properties: BTreeMap<String, serde_json::Value>,
    /// Environment variables, in message order.
    pub environment: Vec<EnvironmentVariableViewModel>,
    /// Endpoints whose URLs parsed as absolute URLs.
    pub urls: Vec<UrlViewModel>,
    /// Free-form state text.
    pub state: Option<String>,
    /// The state, when it is one of the known states.
    pub known_state: Option<KnownResourceState>,
    /// Style hint for the state.
    pub state_style: Option<String>,
    /// Commands the resource supports.
    pub commands: Vec<CommandViewModel>,
}

/// A command response ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCommandResponseViewModel {
    /// Error text when the command failed.
    pub error_message: Option<String>,
    /// Outcome kind.
    pub kind: ResourceCommandResponseKind,
}
