use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContentStore, StoreError};
use crate::{
    comment::{Comment, NewComment},
    portfolio::{GalleryItem, Work},
    post::Post,
    review::{NewReview, Review},
};

/// A stored review together with its moderation flags.
#[derive(Debug, Clone)]
pub struct StoredReview {
    pub review: Review,
    pub approved: bool,
    pub is_spam: bool,
}

#[derive(Default)]
struct Documents {
    posts: Vec<Post>,
    comments: Vec<Comment>,
    reviews: Vec<StoredReview>,
    gallery: Vec<GalleryItem>,
    works: Vec<Work>,
}

/// In-process store for local previews and tests. Nothing survives a
/// restart.
pub struct MemoryStore {
    documents: RwLock<Documents>,
    writable: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::default(),
            writable: true,
        }
    }

    pub fn with_write_credential(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    pub async fn add_post(&self, post: Post) {
        self.documents.write().await.posts.push(post);
    }

    pub async fn add_gallery_item(&self, item: GalleryItem) {
        self.documents.write().await.gallery.push(item);
    }

    pub async fn add_work(&self, work: Work) {
        self.documents.write().await.works.push(work);
    }

    /// Inserts a comment as-is, moderation flag included.
    pub async fn add_comment(&self, comment: Comment) {
        self.documents.write().await.comments.push(comment);
    }

    /// Every comment, pending ones included, in insertion order.
    pub async fn comments(&self) -> Vec<Comment> {
        self.documents.read().await.comments.clone()
    }

    pub async fn reviews(&self) -> Vec<StoredReview> {
        self.documents.read().await.reviews.clone()
    }

    /// Stands in for the moderator. Returns whether a document was found.
    pub async fn approve(&self, id: &str) -> bool {
        let mut documents = self.documents.write().await;
        if let Some(comment) = documents.comments.iter_mut().find(|c| c.id == id) {
            comment.approved = true;
            return true;
        }
        if let Some(stored) = documents.reviews.iter_mut().find(|r| r.review.id == id) {
            stored.approved = true;
            return true;
        }
        false
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn has_write_credential(&self) -> bool {
        self.writable
    }

    async fn posts(&self) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = self
            .documents
            .read()
            .await
            .posts
            .iter()
            .filter(|p| p.published_at.is_some())
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(posts)
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .posts
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn approved_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let mut comments: Vec<Comment> = self
            .documents
            .read()
            .await
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && c.approved)
            .cloned()
            .collect();
        // Stable, so equal timestamps keep insertion order.
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn approved_reviews(&self) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = self
            .documents
            .read()
            .await
            .reviews
            .iter()
            .filter(|r| r.approved && !r.is_spam)
            .map(|r| r.review.clone())
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn gallery_items(&self, category: Option<&str>) -> Result<Vec<GalleryItem>, StoreError> {
        let mut items: Vec<GalleryItem> = self
            .documents
            .read()
            .await
            .gallery
            .iter()
            .filter(|item| category.is_none_or(|c| item.category == c))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn works(&self) -> Result<Vec<Work>, StoreError> {
        let mut works: Vec<Work> = self
            .documents
            .read()
            .await
            .works
            .iter()
            .map(|w| Work {
                body: String::new(),
                gallery: Default::default(),
                ..w.clone()
            })
            .collect();
        works.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(works)
    }

    async fn work_by_slug(&self, slug: &str) -> Result<Option<Work>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .works
            .iter()
            .find(|w| w.slug == slug)
            .cloned())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<String, StoreError> {
        if !self.writable {
            return Err(StoreError::MissingCredential);
        }
        let id = Uuid::new_v4().to_string();
        self.documents.write().await.comments.push(Comment {
            id: id.clone(),
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            author: comment.author,
            body: comment.body,
            created_at: Utc::now(),
            approved: false,
        });
        Ok(id)
    }

    async fn create_review(&self, review: NewReview) -> Result<String, StoreError> {
        if !self.writable {
            return Err(StoreError::MissingCredential);
        }
        let id = Uuid::new_v4().to_string();
        self.documents.write().await.reviews.push(StoredReview {
            review: Review {
                id: id.clone(),
                name: review.name,
                email: review.email,
                role: review.role,
                content: review.content,
                created_at: Utc::now(),
            },
            approved: false,
            is_spam: false,
        });
        Ok(id)
    }
}
