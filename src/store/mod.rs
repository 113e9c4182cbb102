//! The content store: posts, comments and kind-words reviews.

mod memory;
mod sanity;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    comment::{Comment, NewComment},
    config::StoreConfig,
    portfolio::{GalleryItem, Work},
    post::Post,
    review::{NewReview, Review},
};

pub use memory::{MemoryStore, StoredReview};
pub use sanity::SanityStore;
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StoreError {
    #[error("content store request failed: {0}")]
    #[diagnostic(code(lumen::store::http))]
    Http(#[from] reqwest::Error),

    #[error("content store answered {status}: {body}")]
    #[diagnostic(code(lumen::store::status))]
    Status { status: u16, body: String },

    #[error("database error: {0}")]
    #[diagnostic(code(lumen::store::database))]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    #[diagnostic(code(lumen::store::migrate))]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("no write token configured for the content store")]
    #[diagnostic(
        code(lumen::store::credential),
        help("set store.write_token in site.toml or SITE_STORE__WRITE_TOKEN")
    )]
    MissingCredential,

    #[error("unexpected content store response: {0}")]
    #[diagnostic(code(lumen::store::malformed))]
    Malformed(String),
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Whether writes can be attempted at all.
    fn has_write_credential(&self) -> bool;

    /// Published posts, newest first.
    async fn posts(&self) -> Result<Vec<Post>, StoreError>;

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError>;

    /// Approved comments of one post, oldest first. Never cached.
    async fn approved_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError>;

    /// Approved, non-spam reviews, newest first.
    async fn approved_reviews(&self) -> Result<Vec<Review>, StoreError>;

    /// Gallery assets that are not archived, newest first, optionally of one
    /// category only.
    async fn gallery_items(&self, category: Option<&str>) -> Result<Vec<GalleryItem>, StoreError>;

    /// Portfolio works, most recent year first. Bodies and galleries are
    /// left empty.
    async fn works(&self) -> Result<Vec<Work>, StoreError>;

    async fn work_by_slug(&self, slug: &str) -> Result<Option<Work>, StoreError>;

    /// Stores a pending comment and returns its id.
    async fn create_comment(&self, comment: NewComment) -> Result<String, StoreError>;

    /// Stores a pending review and returns its id.
    async fn create_review(&self, review: NewReview) -> Result<String, StoreError>;
}

pub async fn open(config: &StoreConfig) -> Result<Arc<dyn ContentStore>, StoreError> {
    Ok(match config {
        StoreConfig::Sanity(sanity) => Arc::new(SanityStore::new(sanity.clone())),
        StoreConfig::Sqlite { url } => {
            let store = SqliteStore::connect(url).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        StoreConfig::Memory { write_token } => {
            let writable = write_token.as_deref().is_some_and(|t| !t.is_empty());
            Arc::new(MemoryStore::new().with_write_credential(writable))
        }
    })
}
