/// Gallery endpoints
///
/// - `GET /galleries` - List own galleries
/// - `POST /galleries` - Create a gallery
/// - `GET /galleries/:id` - Show a gallery (public)
/// - `POST /galleries/:id` - Rename a gallery (owner)
/// - `GET /galleries/:id/edit` - Gallery details for its owner
/// - `POST /galleries/:id/delete` - Delete a gallery (owner)
/// - `GET /galleries/:id/images/:filename` - Image file (public)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::redirect,
};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use snapvault_shared::{
    auth::current_user::CurrentUser,
    models::gallery::{CreateGallery, Gallery},
    models::user::User,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Create and rename form
#[derive(Debug, Deserialize, Validate)]
pub struct GalleryForm {
    /// New title
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
}

/// Gallery with its image file names
#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    /// Gallery ID
    pub id: Uuid,

    /// Display title
    pub title: String,

    /// Image file names, sorted
    pub images: Vec<String>,
}

async fn gallery_response(state: &AppState, gallery: Gallery) -> ApiResult<GalleryResponse> {
    let images = state
        .images
        .images(gallery.id)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to list images: {}", e)))?;

    Ok(GalleryResponse {
        id: gallery.id,
        title: gallery.title,
        images: images.into_iter().map(|image| image.filename).collect(),
    })
}

async fn find_gallery(state: &AppState, id: Uuid) -> ApiResult<Gallery> {
    Gallery::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Gallery not found".to_string()))
}

/// Loads a gallery the user may modify
async fn owned_gallery(state: &AppState, id: Uuid, user: &User) -> ApiResult<Gallery> {
    let gallery = find_gallery(state, id).await?;
    if !gallery.is_owned_by(user.id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to edit this gallery".to_string(),
        ));
    }
    Ok(gallery)
}

/// Lists the signed-in user's galleries
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Gallery>>> {
    Ok(Json(Gallery::list_by_user(&state.db, user.id).await?))
}

/// Creates a gallery and redirects to its edit page
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<GalleryForm>,
) -> ApiResult<Response> {
    form.validate()?;

    let gallery = Gallery::create(
        &state.db,
        CreateGallery {
            user_id: user.id,
            title: form.title,
        },
    )
    .await?;

    info!(gallery_id = %gallery.id, user_id = %user.id, "Gallery created");
    Ok(redirect(&format!("/galleries/{}/edit", gallery.id)))
}

/// Shows a gallery and its images
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<GalleryResponse>> {
    let gallery = find_gallery(&state, id).await?;
    Ok(Json(gallery_response(&state, gallery).await?))
}

/// Gallery details for its owner
pub async fn edit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<GalleryResponse>> {
    let gallery = owned_gallery(&state, id, &user).await?;
    Ok(Json(gallery_response(&state, gallery).await?))
}

/// Renames a gallery
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<GalleryForm>,
) -> ApiResult<Response> {
    form.validate()?;
    owned_gallery(&state, id, &user).await?;

    Gallery::update_title(&state.db, id, &form.title)
        .await?
        .ok_or_else(|| ApiError::NotFound("Gallery not found".to_string()))?;

    Ok(redirect(&format!("/galleries/{}/edit", id)))
}

/// Deletes a gallery
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    owned_gallery(&state, id, &user).await?;
    Gallery::delete(&state.db, id).await?;

    info!(gallery_id = %id, user_id = %user.id, "Gallery deleted");
    Ok(redirect("/galleries"))
}

/// Serves one image file
pub async fn image(
    State(state): State<AppState>,
    Path((id, filename)): Path<(Uuid, String)>,
) -> ApiResult<Response> {
    let image = state
        .images
        .image(id, &filename)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to read image: {}", e)))?
        .ok_or_else(|| ApiError::NotFound("Image not found".to_string()))?;

    let bytes = tokio::fs::read(&image.path)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to read image: {}", e)))?;

    Ok(([(header::CONTENT_TYPE, content_type(&image.filename))], bytes).into_response())
}

fn content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("a.png"), "image/png");
        assert_eq!(content_type("a.JPG"), "image/jpeg");
        assert_eq!(content_type("a.jpeg"), "image/jpeg");
        assert_eq!(content_type("a.gif"), "image/gif");
        assert_eq!(content_type("noext"), "application/octet-stream");
    }

    #[test]
    fn test_gallery_form_validation() {
        assert!(GalleryForm { title: "Cats".to_string() }.validate().is_ok());
        assert!(GalleryForm { title: String::new() }.validate().is_err());
        assert!(GalleryForm { title: "x".repeat(201) }.validate().is_err());
    }
}
