use catalog::{visible, FilterField, FilterState};
use shared::{
    domain::{CatalogItem, ItemId},
    error::{ApiError, ErrorCode},
    protocol::{split_list, CatalogQuery, NewCatalogItem},
};
use storage::Storage;
use tracing::{debug, info};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 4000;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Full catalog, or the subset matching `query` when any parameter is set.
pub async fn list_catalog(
    ctx: &ApiContext,
    query: &CatalogQuery,
) -> Result<Vec<CatalogItem>, ApiError> {
    let items = ctx.storage.list_items().await.map_err(internal)?;
    if query.is_empty() {
        return Ok(items);
    }

    let state = filter_state_from_query(query);
    let shown: Vec<CatalogItem> = visible(&items, &state).into_iter().cloned().collect();
    debug!(total = items.len(), shown = shown.len(), "filtered catalog");
    Ok(shown)
}

pub fn filter_state_from_query(query: &CatalogQuery) -> FilterState {
    let mut state = FilterState::default();
    if let Some(search) = query.search.as_deref() {
        state.set_search_term(search.trim());
    }
    let categories = [
        (FilterField::Topic, &query.topic),
        (FilterField::Difficulty, &query.difficulty),
        (FilterField::Length, &query.length),
    ];
    for (field, raw) in categories {
        for value in raw.as_deref().into_iter().flat_map(split_list) {
            if !state.selections(field).contains(value) {
                state.toggle(field, value);
            }
        }
    }
    state
}

pub async fn get_item(ctx: &ApiContext, item_id: &ItemId) -> Result<CatalogItem, ApiError> {
    ctx.storage
        .load_item(item_id)
        .await
        .map_err(internal)?
        .map(|stored| stored.item)
        .ok_or_else(|| ApiError::not_found(format!("tutorial '{item_id}' not found")))
}

pub async fn create_item(
    ctx: &ApiContext,
    new_item: NewCatalogItem,
) -> Result<CatalogItem, ApiError> {
    validate_new_item(&new_item)?;
    let created = ctx
        .storage
        .insert_item(&new_item)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            ApiError::validation(format!(
                "tutorial '{}' already exists",
                new_item.id.as_ref().map(ItemId::as_str).unwrap_or_default()
            ))
        })?;
    info!(item_id = %created.id, title = %created.title, "tutorial created");
    Ok(created)
}

pub async fn delete_item(ctx: &ApiContext, item_id: &ItemId) -> Result<(), ApiError> {
    let removed = ctx.storage.delete_item(item_id).await.map_err(internal)?;
    if !removed {
        return Err(ApiError::not_found(format!("tutorial '{item_id}' not found")));
    }
    info!(%item_id, "tutorial deleted");
    Ok(())
}

pub fn validate_new_item(new_item: &NewCatalogItem) -> Result<(), ApiError> {
    let title = new_item.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::validation(format!(
            "title exceeds {MAX_TITLE_CHARS} characters"
        )));
    }
    if new_item.description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ApiError::validation(format!(
            "description exceeds {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    if let Some(id) = &new_item.id {
        if id.as_str().trim().is_empty() {
            return Err(ApiError::validation("id cannot be blank"));
        }
    }
    Ok(())
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}
