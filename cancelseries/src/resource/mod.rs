//! Resource snapshots: wire messages and the view models built from them.
//!
//! The conversion checks that required fields are present and drops
//! sub-records that cannot be represented, such as URLs that do not parse.

mod mapping;
mod message;
mod view_model;

pub use message::{
    EnvironmentVariable, ResourceCommand, ResourceCommandResponse, ResourceCommandResponseKind,
    ResourceMessage, ResourceProperty, ResourceUrl,
};
pub use view_model::{
    CommandViewModel, EnvironmentVariableViewModel, KnownResourceState,
    ResourceCommandResponseViewModel, ResourceViewModel, UrlViewModel,
};
