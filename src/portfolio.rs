//! Gallery assets and portfolio work entries. Both are authored in the
//! content store and only ever read here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Gallery filter choices, in the order they are offered.
pub const CATEGORIES: [&str; 6] = [
    "Portraits",
    "Couples",
    "Events",
    "Music & Artists",
    "Brands",
    "Personal",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: String,
    pub title: String,
    pub category: String,
    pub medium: Option<String>,
    pub media_type: MediaType,
    pub image_url: Option<String>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

impl GalleryItem {
    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    pub fn alt_text(&self) -> &str {
        self.alt.as_deref().unwrap_or(&self.title)
    }
}

/// A portfolio project. `gallery` holds image URLs and is only filled in
/// when a single work is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub year: Option<i64>,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: String,
    pub cover_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Json<Vec<String>>,
    #[serde(default)]
    pub gallery: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl Work {
    pub fn images(&self) -> &[String] {
        &self.gallery
    }

    pub fn tag_list(&self) -> String {
        self.tags.join(", ")
    }
}

/// `?category=..` for a filter link. Only the characters that occur in
/// [`CATEGORIES`] need escaping.
pub fn category_query(category: &str) -> String {
    let encoded = category
        .replace('%', "%25")
        .replace('&', "%26")
        .replace('+', "%2B")
        .replace(' ', "+");
    format!("?category={encoded}")
}
