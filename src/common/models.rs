use crate::config::Config;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Serialize, Default)]
pub struct UIConfiguration {
    #[serde(rename = "clientId")]
    pub client_id: String,
    pub realm: String,
    pub url: String,
    pub deployment: String,
}

impl UIConfiguration {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client_id: config.keycloak_ui_id.clone(),
            realm: config.keycloak_realm.clone(),
            url: config.keycloak_url.clone(),
            deployment: config.deployment.clone(),
        }
    }
}

#[derive(ToSchema, Deserialize, Serialize)]
pub struct HealthCheck {
    pub status: String,
}

/// Current value of an active model field, whether freshly set or loaded
pub fn active_value<T>(value: &sea_orm::ActiveValue<T>) -> Option<T>
where
    T: Clone + Into<sea_orm::Value>,
{
    match value {
        sea_orm::ActiveValue::Set(v) | sea_orm::ActiveValue::Unchanged(v) => Some(v.clone()),
        sea_orm::ActiveValue::NotSet => None,
    }
}
