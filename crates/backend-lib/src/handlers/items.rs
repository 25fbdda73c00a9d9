// ============================
// inventory-backend-lib/src/handlers/items.rs
// ============================
//! Item CRUD handlers.
//!
//! Every mutation goes through [`policy::authorize`] after the existence
//! check: a missing item is 404 for everyone, an existing item someone else
//! owns is 403. The owner reference comes from the middleware-attached
//! identity, never from the request body.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use inventory_common::{ItemCreate, ItemUpdate, ItemView, OwnerView};
use metrics::counter;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::AppError;
use crate::middleware::MaybeIdentity;
use crate::policy::{authorize, Action, Decision};
use crate::storage::{ItemRecord, Store};
use crate::AppState;

/// Build the public view of an item. The owner block is resolved only for
/// authenticated callers.
async fn item_view(
    store: &dyn Store,
    item: ItemRecord,
    include_owner: bool,
) -> Result<ItemView, AppError> {
    let created_by = if include_owner {
        store.user_by_id(item.created_by).await?.map(|owner| OwnerView {
            id: owner.id,
            username: owner.username,
            email: owner.email,
        })
    } else {
        None
    };

    Ok(ItemView {
        id: item.id,
        name: item.name,
        description: item.description,
        quantity: item.quantity,
        price: item.price,
        category: item.category,
        created_at: item.created_at,
        created_by,
    })
}

/// `GET /items` (optional auth)
pub async fn list_items(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
) -> Result<Json<Vec<ItemView>>, AppError> {
    let store = state.connection.acquire().await?;
    let items = store.list_items().await?;

    let mut views = Vec::with_capacity(items.len());
    for item in items {
        views.push(item_view(store.as_ref(), item, identity.is_some()).await?);
    }
    Ok(Json(views))
}

/// `GET /items/{id}` (optional auth)
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeIdentity(identity): MaybeIdentity,
) -> Result<Json<ItemView>, AppError> {
    let store = state.connection.acquire().await?;
    let item = store
        .item(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
    Ok(Json(item_view(store.as_ref(), item, identity.is_some()).await?))
}

/// `POST /items` (mandatory auth)
pub async fn create_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<ItemCreate>,
) -> Result<(StatusCode, Json<ItemView>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Item name is required".to_string()));
    }

    let store = state.connection.acquire().await?;

    let item = ItemRecord {
        id: Uuid::new_v4(),
        name: body.name.trim().to_string(),
        description: body.description,
        quantity: body.quantity,
        price: body.price,
        category: body.category,
        created_by: identity.user_id,
        created_at: Utc::now(),
    };

    store.insert_item(item.clone()).await?;
    counter!("items_created_total").increment(1);

    let view = item_view(store.as_ref(), item, true).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `PUT /items/{id}` (mandatory auth, owner or admin)
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<ItemUpdate>,
) -> Result<Json<ItemView>, AppError> {
    let store = state.connection.acquire().await?;

    // existence before ownership
    let mut item = store
        .item(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

    if authorize(Action::Update, item.created_by, identity.user_id, identity.role)
        == Decision::Deny
    {
        counter!("authz_denied_total").increment(1);
        return Err(AppError::Forbidden);
    }

    // partial update: only supplied fields change, ownership never does
    if let Some(name) = body.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Item name is required".to_string()));
        }
        item.name = name.trim().to_string();
    }
    if let Some(description) = body.description {
        item.description = Some(description);
    }
    if let Some(quantity) = body.quantity {
        item.quantity = quantity;
    }
    if let Some(price) = body.price {
        item.price = Some(price);
    }
    if let Some(category) = body.category {
        item.category = Some(category);
    }

    store.update_item(item.clone()).await?;
    Ok(Json(item_view(store.as_ref(), item, true).await?))
}

/// `DELETE /items/{id}` (mandatory auth, owner or admin)
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    let store = state.connection.acquire().await?;

    let item = store
        .item(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

    if authorize(Action::Delete, item.created_by, identity.user_id, identity.role)
        == Decision::Deny
    {
        counter!("authz_denied_total").increment(1);
        return Err(AppError::Forbidden);
    }

    store.delete_item(id).await?;
    Ok(Json(json!({ "message": "Item deleted successfully" })))
}
