//! Contact form handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::contact::{ContactRepository, ContactSort, ContactUpdate, NewContact};
use crate::pagination::{Page, PageRequest};
use crate::web::dto::{
    normalize_email, ApiResponse, ContactListData, ContactListQuery, ContactRequest,
    ContactResponse, Pagination, UpdateContactRequest, ValidatedJson, ValidatedQuery,
};
use crate::web::error::{ApiError, FieldError};
use crate::web::handlers::{parse_id, AppState};
use crate::web::middleware::AdminUser;

/// POST /api/contact - Store a message and notify the site owner.
///
/// The notification is sent in the background; its failure is only
/// logged.
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ContactResponse>>), ApiError> {
    let contact = ContactRepository::new(state.db.pool())
        .create(&NewContact {
            name: req.name.trim().to_string(),
            email: normalize_email(&req.email),
            message: req.message.trim().to_string(),
        })
        .await?;

    tracing::info!(contact_id = contact.id, "Contact message received");

    if state.mailer.is_some() {
        let state = state.clone();
        let notice = contact.clone();
        tokio::spawn(async move {
            if let Some(mailer) = &state.mailer {
                if let Err(e) = mailer.notify(&notice).await {
                    tracing::error!(contact_id = notice.id, error = %e, "Failed to send contact notification");
                }
            }
        });
    } else {
        tracing::warn!(contact_id = contact.id, "Mail not configured; skipping notification");
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Contact created successfully",
            ContactResponse::from(contact),
        )),
    ))
}

/// GET /api/contact - Inbox (admin).
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ValidatedQuery(query): ValidatedQuery<ContactListQuery>,
) -> Result<Json<ApiResponse<ContactListData>>, ApiError> {
    let sort = ContactSort::new(query.sort.as_deref(), query.order.as_deref()).map_err(|message| {
        let mut error = FieldError::new("sort", message);
        error.value = query.sort.clone().map(serde_json::Value::String);
        ApiError::validation(vec![error])
    })?;
    let request = PageRequest::new(query.page, query.limit);

    let repo = ContactRepository::new(state.db.pool());
    let contacts = repo
        .list(sort, request.offset(), request.limit as i64)
        .await?;
    let total = repo.count().await?;
    let page = Page::new(contacts, request, total);

    let pagination = Pagination::from(&page);
    Ok(Json(ApiResponse::new(
        "Contacts fetched successfully",
        ContactListData {
            contacts: page.items.into_iter().map(ContactResponse::from).collect(),
            pagination,
        },
    )))
}

/// GET /api/contact/:id - One message (admin).
pub async fn get_contact(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ContactResponse>>, ApiError> {
    let id = parse_id(&id, "contact")?;
    let contact = ContactRepository::new(state.db.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Contact not found"))?;

    Ok(Json(ApiResponse::new(
        "Contact fetched successfully",
        ContactResponse::from(contact),
    )))
}

/// PUT /api/contact/:id - Edit a message (admin).
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateContactRequest>,
) -> Result<Json<ApiResponse<ContactResponse>>, ApiError> {
    let id = parse_id(&id, "contact")?;
    let update = ContactUpdate {
        name: req.name.map(|n| n.trim().to_string()),
        email: req.email.as_deref().map(normalize_email),
        message: req.message.map(|m| m.trim().to_string()),
    };

    let contact = ContactRepository::new(state.db.pool())
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Contact not found"))?;

    Ok(Json(ApiResponse::new(
        "Contact updated successfully",
        ContactResponse::from(contact),
    )))
}

/// DELETE /api/contact/:id - Delete a message (admin).
pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = parse_id(&id, "contact")?;
    if !ContactRepository::new(state.db.pool()).delete(id).await? {
        return Err(ApiError::not_found("Contact not found"));
    }
    Ok(Json(ApiResponse::message("Contact deleted successfully")))
}
