//! Credential type definitions: which fields a credential of a given type has.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::json;

use crate::nodes::description::{NodeProperty, NodePropertyType};

/// Shape of one credential type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialType {
    pub name: String,
    pub display_name: String,
    pub properties: Vec<NodeProperty>,
}

impl CredentialType {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        properties: Vec<NodeProperty>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            properties,
        }
    }

    pub fn property(&self, name: &str) -> Option<&NodeProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Lookup of credential types by name.
#[derive(Debug, Clone, Default)]
pub struct CredentialTypes {
    types: HashMap<String, CredentialType>,
}

impl CredentialTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The credential types used by the compiled-in nodes.
    pub fn builtin() -> Self {
        let mut types = Self::new();
        types.register(CredentialType::new(
            "httpBasicAuth",
            "Basic Auth",
            vec![
                string("user", "User"),
                password("password", "Password"),
            ],
        ));
        types.register(CredentialType::new(
            "httpHeaderAuth",
            "Header Auth",
            vec![string("name", "Name"), password("value", "Value")],
        ));
        types.register(CredentialType::new(
            "httpQueryAuth",
            "Query Auth",
            vec![string("name", "Name"), password("value", "Value")],
        ));
        types.register(CredentialType::new(
            "oAuth2Api",
            "OAuth2 API",
            vec![
                string("authUrl", "Authorization URL"),
                string("accessTokenUrl", "Access Token URL"),
                string("clientId", "Client ID"),
                password("clientSecret", "Client Secret"),
                string("scope", "Scope"),
            ],
        ));
        types
    }

    pub fn register(&mut self, credential_type: CredentialType) {
        self.types
            .insert(credential_type.name.clone(), credential_type);
    }

    pub fn get(&self, name: &str) -> Option<&CredentialType> {
        self.types.get(name)
    }
}

fn string(name: &str, display_name: &str) -> NodeProperty {
    NodeProperty::new(name, display_name, NodePropertyType::String).with_default(json!(""))
}

fn password(name: &str, display_name: &str) -> NodeProperty {
    string(name, display_name).with_type_options(json!({ "password": true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_password_fields() {
        let types = CredentialTypes::builtin();
        let basic = types.get("httpBasicAuth").unwrap();
        assert!(basic.property("password").unwrap().is_password());
        assert!(!basic.property("user").unwrap().is_password());
        assert!(types.get("slackApi").is_none());
    }
}
