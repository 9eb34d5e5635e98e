use super::models::{ProductParameter, ProductParameterCreate, ProductParameterUpdate};
use crate::common::auth::protect_router;
use crate::common::state::AppState;
use crudcrate::CRUDResource;
use utoipa_axum::{router::OpenApiRouter, routes};

#[allow(dead_code)]
mod generated {
    use crate::specifications::models::{
        ProductParameter, ProductParameterCreate, ProductParameterList, ProductParameterUpdate,
    };
    use crudcrate::{CRUDResource, crud_handlers};
    use sea_orm::ConnectionTrait;

    crud_handlers!(
        ProductParameter,
        ProductParameterUpdate,
        ProductParameterCreate,
        ProductParameterList
    );
}

crate::validated_write_handlers!(ProductParameter, ProductParameterUpdate, ProductParameterCreate);

pub fn router(state: &AppState) -> OpenApiRouter
where
    ProductParameter: CRUDResource,
{
    let mutating_router = OpenApiRouter::new()
        .routes(routes!(generated::get_one_handler))
        .routes(routes!(generated::get_all_handler))
        .routes(routes!(create_one_handler))
        .routes(routes!(update_one_handler))
        .routes(routes!(generated::delete_one_handler))
        .routes(routes!(generated::delete_many_handler))
        .with_state(state.db.clone());

    protect_router(
        mutating_router,
        state,
        ProductParameter::RESOURCE_NAME_PLURAL,
    )
}
