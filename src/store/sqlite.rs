use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use uuid::Uuid;

use super::{ContentStore, StoreError};
use crate::{
    comment::{Comment, NewComment},
    portfolio::{GalleryItem, Work},
    post::Post,
    review::{NewReview, Review},
};

/// Self-hosted store in a local SQLite file. The file itself is the write
/// credential, so writes are always allowed.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    fn has_write_credential(&self) -> bool {
        true
    }

    async fn posts(&self) -> Result<Vec<Post>, StoreError> {
        Ok(sqlx::query_as::<_, Post>(
            "SELECT id, slug, title, excerpt, body, published_at FROM posts
             WHERE published_at IS NOT NULL ORDER BY published_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        Ok(sqlx::query_as::<_, Post>(
            "SELECT id, slug, title, excerpt, body, published_at FROM posts WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn approved_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        Ok(sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, parent_id, author, body, created_at, approved FROM comments
             WHERE post_id = ? AND approved = 1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn approved_reviews(&self) -> Result<Vec<Review>, StoreError> {
        Ok(sqlx::query_as::<_, Review>(
            "SELECT id, name, email, role, content, created_at FROM reviews
             WHERE approved = 1 AND is_spam = 0 ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn gallery_items(&self, category: Option<&str>) -> Result<Vec<GalleryItem>, StoreError> {
        Ok(sqlx::query_as::<_, GalleryItem>(
            "SELECT id, title, category, medium, media_type, image_url, alt, caption, video_url,
                    featured, created_at
             FROM gallery_items
             WHERE archived = 0 AND (?1 IS NULL OR category = ?1)
             ORDER BY created_at DESC",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn works(&self) -> Result<Vec<Work>, StoreError> {
        Ok(sqlx::query_as::<_, Work>(
            "SELECT id, slug, title, year, excerpt, '' AS body, cover_url, featured, tags,
                    '[]' AS gallery, created_at
             FROM works ORDER BY year DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn work_by_slug(&self, slug: &str) -> Result<Option<Work>, StoreError> {
        Ok(sqlx::query_as::<_, Work>(
            "SELECT id, slug, title, year, excerpt, body, cover_url, featured, tags, gallery,
                    created_at
             FROM works WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO comments (id, post_id, parent_id, author, body, created_at, approved)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
        )
        .bind(&id)
        .bind(&comment.post_id)
        .bind(&comment.parent_id)
        .bind(&comment.author)
        .bind(&comment.body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn create_review(&self, review: NewReview) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO reviews (id, name, email, role, content, created_at, approved, is_spam)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0)",
        )
        .bind(&id)
        .bind(&review.name)
        .bind(&review.email)
        .bind(&review.role)
        .bind(&review.content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteStore::from_pool(pool);
        store.migrate().await.unwrap();
        store
    }

    async fn approve(store: &SqliteStore, id: &str) {
        sqlx::query("UPDATE comments SET approved = 1 WHERE id = ?")
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();
    }

    fn new_comment(body: &str, parent_id: Option<String>) -> NewComment {
        NewComment {
            post_id: "post-1".to_string(),
            parent_id,
            author: "Ada".to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn only_approved_comments_are_read_back_in_order() {
        let store = store().await;

        let first = store.create_comment(new_comment("first", None)).await.unwrap();
        let pending = store.create_comment(new_comment("pending", None)).await.unwrap();
        let reply = store
            .create_comment(new_comment("reply", Some(first.clone())))
            .await
            .unwrap();
        store
            .create_comment(NewComment {
                post_id: "post-2".to_string(),
                ..new_comment("elsewhere", None)
            })
            .await
            .unwrap();

        approve(&store, &first).await;
        approve(&store, &reply).await;

        let comments = store.approved_comments("post-1").await.unwrap();
        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, [first.as_str(), reply.as_str()]);
        assert!(comments.iter().all(|c| c.approved));
        assert!(!ids.contains(&pending.as_str()));
        assert_eq!(comments[1].parent_id.as_deref(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn new_reviews_wait_for_moderation() {
        let store = store().await;
        let id = store
            .create_review(NewReview {
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
                role: None,
                content: "Made us feel at ease all day.".to_string(),
            })
            .await
            .unwrap();

        assert!(store.approved_reviews().await.unwrap().is_empty());

        sqlx::query("UPDATE reviews SET approved = 1 WHERE id = ?")
            .bind(&id)
            .execute(store.pool())
            .await
            .unwrap();
        let reviews = store.approved_reviews().await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].email, "grace@example.com");
    }

    #[tokio::test]
    async fn gallery_hides_archived_and_filters_by_category() {
        let store = store().await;
        sqlx::query(
            "INSERT INTO gallery_items (id, title, category, media_type, archived, created_at)
             VALUES
             ('g1', 'Vows', 'Couples', 'photo', 0, '2024-05-01T10:00:00Z'),
             ('g2', 'Stage', 'Events', 'video', 0, '2024-05-02T10:00:00Z'),
             ('g3', 'Old', 'Couples', 'photo', 1, '2024-05-03T10:00:00Z'),
             ('g4', 'Elopement', 'Couples', 'photo', 0, '2024-05-04T10:00:00Z')",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let all = store.gallery_items(None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["g4", "g2", "g1"]);
        assert!(all[1].is_video());

        let couples = store.gallery_items(Some("Couples")).await.unwrap();
        let ids: Vec<&str> = couples.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["g4", "g1"]);
        assert!(store.gallery_items(Some("Brands")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn works_list_newest_year_first_and_load_in_full() {
        let store = store().await;
        sqlx::query(
            "INSERT INTO works (id, slug, title, year, body, tags, gallery, created_at) VALUES
             ('w1', 'harbour', 'Harbour', 2022, 'Boats at dawn', '[\"film\"]',
              '[\"https://cdn.example/1.jpg\"]', '2024-01-01T00:00:00Z'),
             ('w2', 'festival', 'Festival', 2024, 'Three days', '[]', '[]',
              '2024-02-01T00:00:00Z')",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let works = store.works().await.unwrap();
        let slugs: Vec<&str> = works.iter().map(|w| w.slug.as_str()).collect();
        assert_eq!(slugs, ["festival", "harbour"]);
        assert!(works[1].body.is_empty());
        assert!(works[1].gallery.is_empty());
        assert_eq!(works[1].tag_list(), "film");

        let harbour = store.work_by_slug("harbour").await.unwrap().unwrap();
        assert_eq!(harbour.body, "Boats at dawn");
        assert_eq!(*harbour.gallery, ["https://cdn.example/1.jpg"]);
        assert!(store.work_by_slug("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn drafts_are_not_listed() {
        let store = store().await;
        sqlx::query(
            "INSERT INTO posts (id, slug, title, body, published_at) VALUES
             ('p1', 'golden-hour', 'Golden hour', 'text', '2024-05-01T10:00:00Z'),
             ('p2', 'draft', 'Draft', 'text', NULL)",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let posts = store.posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "golden-hour");
        assert!(store.post_by_slug("draft").await.unwrap().is_some());
        assert!(store.post_by_slug("nope").await.unwrap().is_none());
    }
}
