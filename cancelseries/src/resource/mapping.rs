//! Conversion from wire messages to view models.

use super::{
    CommandViewModel, EnvironmentVariableViewModel, ResourceCommandResponse,
    ResourceCommandResponseViewModel, ResourceMessage, ResourceViewModel, UrlViewModel,
};
use crate::errors::{CancelSeriesError, Result};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

impl ResourceMessage {
    /// Converts this message into a view model.
    ///
    /// Fails if a required field is missing. URLs that are not absolute are
    /// dropped.
    pub fn to_view_model(&self) -> Result<ResourceViewModel> {
        let resource = self.name.clone().unwrap_or_default();
        let require = |field: &'static str, value: Option<&String>| {
            value.cloned().ok_or_else(|| CancelSeriesError::MissingField {
                field,
                resource: resource.clone(),
            })
        };

        let name = require("name", self.name.as_ref())?;
        let resource_type = require("resource_type", self.resource_type.as_ref())?;
        let display_name = require("display_name", self.display_name.as_ref())?;
        let uid = require("uid", self.uid.as_ref())?;
        let creation_timestamp = self.created_at.ok_or_else(|| CancelSeriesError::MissingField {
            field: "created_at",
            resource: resource.clone(),
        })?;

        let mut properties = BTreeMap::new();
        for property in &self.properties {
            let key = require("property.name", property.name.as_ref())?;
            let value = property
                .value
                .clone()
                .ok_or_else(|| CancelSeriesError::MissingField {
                    field: "property.value",
                    resource: resource.clone(),
                })?;
            match properties.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(slot) => {
                    return Err(CancelSeriesError::DuplicateProperty {
                        property: slot.key().clone(),
                        resource: resource.clone(),
                    });
                }
            }
        }

        Ok(ResourceViewModel {
            name,
            resource_type,
            display_name,
            uid,
            creation_timestamp,
            properties,
            environment: self.environment_view_models(),
            urls: self.url_view_models(),
            state: self.state.clone(),
            known_state: self.state.as_deref().and_then(|s| s.parse().ok()),
            state_style: self.state_style.clone(),
            commands: self.command_view_models(),
        })
    }

    fn environment_view_models(&self) -> Vec<EnvironmentVariableViewModel> {
        self.environment
            .iter()
            .map(|e| EnvironmentVariableViewModel {
                name: e.name.clone(),
                value: e.value.clone(),
                from_spec: e.is_from_spec,
            })
            .collect()
    }

    fn url_view_models(&self) -> Vec<UrlViewModel> {
        self.urls
            .iter()
            .filter_map(|u| match url::Url::parse(&u.full_url) {
                Ok(url) => Some(UrlViewModel {
                    name: u.name.clone(),
                    url,
                    is_internal: u.is_internal,
                }),
                Err(e) => {
                    debug!(url = %u.full_url, error = %e, "Skipping malformed URL");
                    None
                }
            })
            .collect()
    }

    fn command_view_models(&self) -> Vec<CommandViewModel> {
        self.commands
            .iter()
            .map(|c| CommandViewModel {
                command_type: c.command_type.clone(),
                display_name: c.display_name.clone(),
                confirmation_message: c.confirmation_message.clone(),
                parameter: c.parameter.clone(),
            })
            .collect()
    }
}

impl ResourceCommandResponse {
    /// Converts this response into a view model.
    #[must_use]
    pub fn to_view_model(&self) -> ResourceCommandResponseViewModel {
        ResourceCommandResponseViewModel {
            error_message: self.error_message.clone(),
            kind: self.kind,
        }
    }
}
