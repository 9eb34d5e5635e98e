/// Create and update handlers for a crudcrate resource whose `fn_create` /
/// `fn_update` hooks reject input with `validation_db_error`. Failures go
/// through `ErrorMapper`, so a rejected field answers 400 with the field named
/// in the body and a duplicate answers 409.
///
/// The remaining CRUD handlers still come from `crudcrate::crud_handlers!`.
#[macro_export]
macro_rules! validated_write_handlers {
    ($resource:ty, $update_model:ty, $create_model:ty) => {
        #[utoipa::path(
            post,
            path = "/",
            request_body = $create_model,
            responses(
                (status = axum::http::StatusCode::CREATED, description = "Resource created successfully", body = $resource),
                (status = axum::http::StatusCode::BAD_REQUEST, description = "A field failed validation"),
                (status = axum::http::StatusCode::CONFLICT, description = "Duplicate record")
            ),
            operation_id = format!("create_one_{}", <$resource as crudcrate::CRUDResource>::RESOURCE_NAME_SINGULAR),
            summary = format!("Create one {}", <$resource as crudcrate::CRUDResource>::RESOURCE_NAME_SINGULAR),
            description = format!(
                "Creates a new {}.\n\n{}",
                <$resource as crudcrate::CRUDResource>::RESOURCE_NAME_SINGULAR,
                <$resource as crudcrate::CRUDResource>::RESOURCE_DESCRIPTION
            )
        )]
        pub async fn create_one_handler(
            axum::extract::State(db): axum::extract::State<sea_orm::DatabaseConnection>,
            axum::Json(create_model): axum::Json<$create_model>,
        ) -> $crate::common::errors::BusinessResult<(axum::http::StatusCode, axum::Json<$resource>)> {
            use $crate::common::errors::DbErrorExt;

            <$resource as crudcrate::CRUDResource>::create(&db, create_model)
                .await
                .map(|created| (axum::http::StatusCode::CREATED, axum::Json(created)))
                .map_err(|err| {
                    err.to_business_error(<$resource as crudcrate::CRUDResource>::RESOURCE_NAME_SINGULAR)
                })
        }

        #[utoipa::path(
            put,
            path = "/{id}",
            request_body = $update_model,
            params(
                ("id" = uuid::Uuid, Path, description = "Resource ID")
            ),
            responses(
                (status = axum::http::StatusCode::OK, description = "Resource updated successfully", body = $resource),
                (status = axum::http::StatusCode::BAD_REQUEST, description = "A field failed validation"),
                (status = axum::http::StatusCode::NOT_FOUND, description = "Resource not found"),
                (status = axum::http::StatusCode::CONFLICT, description = "Duplicate record")
            ),
            operation_id = format!("update_one_{}", <$resource as crudcrate::CRUDResource>::RESOURCE_NAME_SINGULAR),
            summary = format!("Update one {}", <$resource as crudcrate::CRUDResource>::RESOURCE_NAME_SINGULAR),
            description = format!(
                "Updates one {} by its ID.\n\n{}",
                <$resource as crudcrate::CRUDResource>::RESOURCE_NAME_SINGULAR,
                <$resource as crudcrate::CRUDResource>::RESOURCE_DESCRIPTION
            )
        )]
        pub async fn update_one_handler(
            axum::extract::State(db): axum::extract::State<sea_orm::DatabaseConnection>,
            axum::extract::Path(id): axum::extract::Path<uuid::Uuid>,
            axum::Json(update_model): axum::Json<$update_model>,
        ) -> $crate::common::errors::BusinessResult<axum::Json<$resource>> {
            use $crate::common::errors::DbErrorExt;

            <$resource as crudcrate::CRUDResource>::update(&db, id, update_model)
                .await
                .map(axum::Json)
                .map_err(|err| {
                    err.to_business_error(<$resource as crudcrate::CRUDResource>::RESOURCE_NAME_SINGULAR)
                })
        }
    };
}
