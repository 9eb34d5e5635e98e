use crate::common::state::AppState;
use axum_keycloak_auth::{PassthroughMode, layer::KeycloakAuthLayer};
use utoipa_axum::router::OpenApiRouter;

/// Keycloak realm role allowed to use the mutating API surface
pub const ADMIN_ROLE: &str = "smartlab-admin";

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Role {
    Administrator,
    Unknown(String),
}
impl axum_keycloak_auth::role::Role for Role {}
impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Administrator => f.write_str(ADMIN_ROLE),
            Role::Unknown(unknown) => f.write_fmt(format_args!("Unknown role: {unknown}")),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value == ADMIN_ROLE {
            Role::Administrator
        } else {
            Role::Unknown(value)
        }
    }
}

/// Require an administrator token on every route of `router` when Keycloak
/// is configured. Without Keycloak (tests, local runs) the routes stay open.
pub fn protect_router(router: OpenApiRouter, state: &AppState, resource: &str) -> OpenApiRouter {
    if let Some(instance) = state.keycloak_auth_instance.clone() {
        router.layer(
            KeycloakAuthLayer::<Role>::builder()
                .instance(instance)
                .passthrough_mode(PassthroughMode::Block)
                .persist_raw_claims(false)
                .expected_audiences(vec![String::from("account")])
                .required_roles(vec![Role::Administrator])
                .build(),
        )
    } else {
        if !state.config.tests_running {
            tracing::warn!("Mutating routes of {resource} router are not protected");
        }
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role_round_trips_through_string() {
        let role = Role::from(ADMIN_ROLE.to_string());
        assert_eq!(role, Role::Administrator);
        assert_eq!(role.to_string(), ADMIN_ROLE);
    }

    #[test]
    fn test_other_roles_are_unknown() {
        let role = Role::from("lab-viewer".to_string());
        assert_eq!(role, Role::Unknown("lab-viewer".to_string()));
        assert_eq!(role.to_string(), "Unknown role: lab-viewer");
    }

    #[test]
    fn test_role_matching_is_case_sensitive() {
        let role = Role::from("SMARTLAB-ADMIN".to_string());
        assert!(matches!(role, Role::Unknown(_)));
    }
}
