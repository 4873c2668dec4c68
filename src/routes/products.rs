use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        BulkDeleteRequest, BulkDeleteResponse, Product, ProductListQuery, ProductListResponse,
        ProductRequest, ProductRow, ReorderRequest, ReorderResponse,
    },
    queries::product_queries,
    resource::{self, ResourceDescriptor},
    services::image_storage_service::{
        delete_objects, delete_single_object, new_image_key, public_url, put_object,
    },
    utils::format::format_price,
};

fn to_row(state: &AppState, product: Product) -> ProductRow {
    let image_urls = product
        .image
        .iter()
        .map(|key| public_url(&state.assets_url, key))
        .collect();

    ProductRow {
        price_display: format_price(&product.price),
        row_class: product.lifecycle.map(|l| l.row_class()),
        image_urls,
        product,
    }
}

/// Storage cleanup after the rows are gone. The database is the source of
/// truth, so a failed delete leaves an orphaned object and a warning rather
/// than failing a request whose change is already committed.
async fn remove_stored_images(state: &AppState, keys: &[String]) {
    if keys.is_empty() {
        return;
    }

    let failed = delete_objects(&state.s3_client, &state.s3_bucket, keys).await;
    if !failed.is_empty() {
        tracing::warn!(
            orphaned = failed.len(),
            total = keys.len(),
            "Stored images left behind after delete"
        );
    }
}

pub async fn get_resource() -> Json<ResourceDescriptor> {
    Json(resource::descriptor())
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>> {
    let (page, per_page, _) = product_queries::page_bounds(params.page, params.per_page);
    let (products, total) = product_queries::search_products(&state.db, &params).await?;

    let data = products
        .into_iter()
        .map(|product| to_row(&state, product))
        .collect();

    Ok(Json(ProductListResponse {
        data,
        total,
        page,
        per_page,
        last_page: ((total + per_page - 1) / per_page).max(1),
    }))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductRow>)> {
    resource::validate_product(&payload, true)?;

    let product = product_queries::create_product(&state.db, &payload).await?;
    tracing::info!(product_id = product.id, "Product created");

    Ok((StatusCode::CREATED, Json(to_row(&state, product))))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductRow>> {
    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    Ok(Json(to_row(&state, product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<ProductRow>> {
    resource::validate_product(&payload, false)?;

    let product = product_queries::update_product(&state.db, id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    Ok(Json(to_row(&state, product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let deleted = product_queries::delete_product(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    remove_stored_images(&state, &deleted.image).await;
    tracing::info!(product_id = id, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_delete_products(
    State(state): State<AppState>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>> {
    if payload.ids.is_empty() {
        return Err(AppError::BadRequest("ids must not be empty".to_string()));
    }

    let deleted = product_queries::delete_products(&state.db, &payload.ids).await?;

    let keys: Vec<String> = deleted.iter().flat_map(|p| p.image.iter().cloned()).collect();
    remove_stored_images(&state, &keys).await;

    tracing::info!(count = deleted.len(), "Products bulk deleted");

    Ok(Json(BulkDeleteResponse {
        deleted: deleted.len() as u64,
    }))
}

pub async fn reorder_products(
    State(state): State<AppState>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>> {
    let mut seen = std::collections::HashSet::new();
    if let Some(duplicate) = payload.ids.iter().find(|id| !seen.insert(**id)) {
        return Err(AppError::BadRequest(format!(
            "Product id {} appears more than once",
            duplicate
        )));
    }

    let updated = product_queries::reorder_products(&state.db, &payload.ids).await?;

    Ok(Json(ReorderResponse { updated }))
}

struct PendingUpload {
    key: String,
    content_type: String,
    body: Vec<u8>,
}

pub async fn upload_product_images(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ProductRow>> {
    if product_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!("Product with id {} not found", id)));
    }

    let mut uploads = Vec::new();
    let mut errors = BTreeMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if !matches!(field.name(), Some("image") | Some("image[]")) {
            continue;
        }

        let index = uploads.len() + errors.len();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        match resource::validate_image(&content_type, &body) {
            Ok(extension) => uploads.push(PendingUpload {
                key: new_image_key(extension),
                content_type,
                body: body.to_vec(),
            }),
            Err(message) => {
                errors.insert(format!("image.{}", index), message);
            }
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if uploads.is_empty() {
        return Err(AppError::BadRequest("No image files were provided".to_string()));
    }

    let mut keys = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let stored = put_object(
            &state.s3_client,
            &state.s3_bucket,
            &upload.key,
            &upload.content_type,
            upload.body,
        )
        .await;

        if let Err(e) = stored {
            remove_stored_images(&state, &keys).await;
            return Err(AppError::ExternalService(format!(
                "Failed to upload image to S3: {}",
                e
            )));
        }
        keys.push(upload.key);
    }

    // The row may have gone away while the objects were uploading.
    let product = match product_queries::append_images(&state.db, id, &keys).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            remove_stored_images(&state, &keys).await;
            return Err(AppError::NotFound(format!("Product with id {} not found", id)));
        }
        Err(e) => {
            remove_stored_images(&state, &keys).await;
            return Err(e);
        }
    };

    tracing::info!(product_id = id, count = keys.len(), "Product images uploaded");

    Ok(Json(to_row(&state, product)))
}

pub async fn delete_product_image(
    State(state): State<AppState>,
    Path((id, file)): Path<(i32, String)>,
) -> Result<Json<ProductRow>> {
    if file.contains('/') {
        return Err(AppError::BadRequest("Invalid image name".to_string()));
    }

    let key = format!("{}/{}", resource::IMAGE_DIRECTORY, file);

    let product = product_queries::remove_image(&state.db, id, &key)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Image {} not found for product {}", file, id))
        })?;

    if let Err(e) = delete_single_object(&state.s3_client, &state.s3_bucket, &key).await {
        tracing::warn!(product_id = id, key = %key, error = %e, "Stored image left behind");
    }

    Ok(Json(to_row(&state, product)))
}
