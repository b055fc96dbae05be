/// Gallery model, database operations and image listing
///
/// A gallery is a titled collection owned by one user. Its images are plain
/// files under `{images_dir}/gallery-{id}/`; only the gallery row lives in
/// the database.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE galleries (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File extensions served as gallery images
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Gallery owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Gallery {
    /// Unique gallery ID
    pub id: Uuid,

    /// Owner
    pub user_id: Uuid,

    /// Display title
    pub title: String,

    /// When the gallery was created
    pub created_at: DateTime<Utc>,

    /// When the gallery was last renamed
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a gallery
#[derive(Debug, Clone)]
pub struct CreateGallery {
    /// Owner
    pub user_id: Uuid,

    /// Display title
    pub title: String,
}

impl Gallery {
    /// Creates a gallery
    pub async fn create(pool: &PgPool, data: CreateGallery) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Gallery>(
            r#"
            INSERT INTO galleries (user_id, title)
            VALUES ($1, $2)
            RETURNING id, user_id, title, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.title)
        .fetch_one(pool)
        .await
    }

    /// Finds a gallery by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Gallery>(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM galleries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists the galleries of a user, oldest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Gallery>(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM galleries
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Renames a gallery
    ///
    /// # Returns
    ///
    /// The updated gallery, or None if it does not exist
    pub async fn update_title(
        pool: &PgPool,
        id: Uuid,
        title: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Gallery>(
            r#"
            UPDATE galleries
            SET title = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, title, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a gallery
    ///
    /// # Returns
    ///
    /// True if a gallery was deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM galleries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether `user_id` owns this gallery
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Image file belonging to a gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    /// Gallery the image belongs to
    pub gallery_id: Uuid,

    /// Path on disk
    #[serde(skip)]
    pub path: PathBuf,

    /// File name within the gallery directory
    pub filename: String,
}

/// Locates gallery images on disk
#[derive(Debug, Clone)]
pub struct ImageLibrary {
    images_dir: PathBuf,
}

impl ImageLibrary {
    /// Creates a library rooted at `images_dir`
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    /// Directory holding the images of one gallery
    pub fn gallery_dir(&self, gallery_id: Uuid) -> PathBuf {
        self.images_dir.join(format!("gallery-{}", gallery_id))
    }

    /// Lists the images of a gallery, sorted by file name
    ///
    /// A gallery without a directory has no images.
    pub async fn images(&self, gallery_id: Uuid) -> std::io::Result<Vec<Image>> {
        let dir = self.gallery_dir(gallery_id);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut images = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() || !has_image_extension(&path) {
                continue;
            }
            if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                images.push(Image {
                    gallery_id,
                    filename: filename.to_string(),
                    path: path.clone(),
                });
            }
        }

        images.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(images)
    }

    /// Looks up a single image
    ///
    /// # Returns
    ///
    /// None if the file does not exist, is not an image, or the name tries
    /// to leave the gallery directory
    pub async fn image(&self, gallery_id: Uuid, filename: &str) -> std::io::Result<Option<Image>> {
        if !is_plain_filename(filename) || !has_image_extension(Path::new(filename)) {
            return Ok(None);
        }

        let path = self.gallery_dir(gallery_id).join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(Image {
                gallery_id,
                path,
                filename: filename.to_string(),
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn is_plain_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\'])
}
