use lumen::{
    comment::CommentForm,
    pages::PageCache,
    review::ReviewForm,
    store::MemoryStore,
    submission::{submit, CONFIGURATION_ERROR, INVALID_INPUT, SPAM_DETECTED},
};

fn comment_form(body: &str) -> CommentForm {
    CommentForm {
        post_id: "post-1".to_string(),
        name: "Ada".to_string(),
        comment: body.to_string(),
        parent_id: None,
        gotcha: None,
    }
}

fn review_form() -> ReviewForm {
    ReviewForm {
        name: "Grace".to_string(),
        email: "grace@example.com".to_string(),
        role: Some("Portrait Session".to_string()),
        content: "Relaxed, fun and the photos are stunning.".to_string(),
        gotcha: None,
    }
}

#[tokio::test]
async fn comment_is_stored_pending_moderation() {
    let store = MemoryStore::new();
    let pages = PageCache::new();

    let mut form = comment_form("Beautiful light in the third frame.");
    form.parent_id = Some("c-0".to_string());
    let outcome = submit(&store, &pages, form, None).await;

    assert!(outcome.success, "{outcome:?}");
    assert_eq!(outcome.message, "Comment submitted! It will appear after moderation.");

    let stored = store.comments().await;
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].approved);
    assert_eq!(stored[0].post_id, "post-1");
    assert_eq!(stored[0].parent_id.as_deref(), Some("c-0"));
    assert_eq!(stored[0].author, "Ada");
}

#[tokio::test]
async fn comment_length_boundaries() {
    let store = MemoryStore::new();
    let pages = PageCache::new();

    for (len, accepted) in [(1, false), (2, true), (1000, true), (1001, false)] {
        let outcome = submit(&store, &pages, comment_form(&"x".repeat(len)), None).await;
        assert_eq!(outcome.success, accepted, "length {len}");
        if !accepted {
            assert_eq!(outcome.message, INVALID_INPUT);
            assert!(outcome.errors.unwrap().contains_key("comment"));
        }
    }

    assert_eq!(store.comments().await.len(), 2);
}

#[tokio::test]
async fn comment_honeypot_is_rejected_and_not_stored() {
    let store = MemoryStore::new();
    let mut form = comment_form("Buy cheap lenses now");
    form.gotcha = Some("http://spam.example".to_string());

    let outcome = submit(&store, &PageCache::new(), form, None).await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, SPAM_DETECTED);
    assert!(store.comments().await.is_empty());
}

#[tokio::test]
async fn review_honeypot_looks_accepted_but_is_dropped() {
    let store = MemoryStore::new();
    let mut form = review_form();
    form.gotcha = Some("filled".to_string());

    let outcome = submit(&store, &PageCache::new(), form, None).await;

    assert!(outcome.success);
    assert!(outcome.errors.is_none());
    assert!(store.reviews().await.is_empty());
}

#[tokio::test]
async fn review_is_stored_pending_and_not_spam() {
    let store = MemoryStore::new();

    let outcome = submit(&store, &PageCache::new(), review_form(), None).await;

    assert!(outcome.success);
    let reviews = store.reviews().await;
    assert_eq!(reviews.len(), 1);
    assert!(!reviews[0].approved);
    assert!(!reviews[0].is_spam);
    assert_eq!(reviews[0].review.email, "grace@example.com");
}

#[tokio::test]
async fn missing_credential_wins_over_invalid_fields() {
    let store = MemoryStore::new().with_write_credential(false);
    let pages = PageCache::new();

    let broken = CommentForm {
        post_id: String::new(),
        name: "A".to_string(),
        comment: "x".to_string(),
        parent_id: None,
        gotcha: Some("bot".to_string()),
    };
    let outcome = submit(&store, &pages, broken, None).await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, CONFIGURATION_ERROR);
    assert!(outcome.errors.is_none());

    let outcome = submit(&store, &pages, ReviewForm::default(), None).await;
    assert_eq!(outcome.message, CONFIGURATION_ERROR);

    assert!(store.comments().await.is_empty());
    assert!(store.reviews().await.is_empty());
}

#[tokio::test]
async fn validation_runs_before_honeypot() {
    let store = MemoryStore::new();
    let mut form = comment_form("x");
    form.gotcha = Some("bot".to_string());

    let outcome = submit(&store, &PageCache::new(), form, None).await;
    assert_eq!(outcome.message, INVALID_INPUT);
}

#[tokio::test]
async fn stored_comment_marks_blog_pages_stale() {
    let store = MemoryStore::new();
    let pages = PageCache::new();
    pages.get_or_render("/blog/golden-hour", || "<p>cached</p>".to_string()).await;
    pages.get_or_render("/contact", || "<p>other</p>".to_string()).await;

    submit(&store, &pages, comment_form("Lovely"), None).await;
    assert!(!pages.contains("/blog/golden-hour").await);
    assert!(pages.contains("/contact").await);

    pages.get_or_render("/blog/golden-hour", || "<p>cached</p>".to_string()).await;
    submit(&store, &pages, review_form(), None).await;
    assert!(pages.contains("/blog/golden-hour").await);
}

#[tokio::test]
async fn comment_from_a_post_page_only_marks_that_page_stale() {
    let store = MemoryStore::new();
    let pages = PageCache::new();
    pages.get_or_render("/blog/golden-hour", || "<p>cached</p>".to_string()).await;
    pages.get_or_render("/blog/other", || "<p>other</p>".to_string()).await;

    let outcome = submit(&store, &pages, comment_form("Lovely"), Some("/blog/golden-hour")).await;

    assert!(outcome.success);
    assert!(!pages.contains("/blog/golden-hour").await);
    assert!(pages.contains("/blog/other").await);
}

#[tokio::test]
async fn origin_outside_the_blog_falls_back_to_every_blog_page() {
    let store = MemoryStore::new();
    let pages = PageCache::new();
    pages.get_or_render("/blog/golden-hour", || "<p>cached</p>".to_string()).await;
    pages.get_or_render("/work/harbour", || "<p>work</p>".to_string()).await;

    submit(&store, &pages, comment_form("Lovely"), Some("/work/harbour")).await;

    assert!(!pages.contains("/blog/golden-hour").await);
    assert!(pages.contains("/work/harbour").await);
}

#[tokio::test]
async fn rejected_comment_leaves_pages_cached() {
    let store = MemoryStore::new();
    let pages = PageCache::new();
    pages.get_or_render("/blog/golden-hour", || "<p>cached</p>".to_string()).await;

    submit(&store, &pages, comment_form("x"), None).await;
    assert!(pages.contains("/blog/golden-hour").await);
}
