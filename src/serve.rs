use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use miette::IntoDiagnostic;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    comment::CommentForm,
    config::{MailConfig, ServerConfig},
    contact::{self, ContactError, ContactForm},
    error::SiteError,
    mail::Mailer,
    markdown,
    pages::PageCache,
    portfolio::{category_query, GalleryItem, Work, CATEGORIES},
    post::Post,
    review::{Review, ReviewForm},
    store::ContentStore,
    submission::{submit, SubmissionOutcome},
    thread::{flatten, load_thread, CommentNode, ThreadEntry},
};

const HOME_POSTS: usize = 3;

#[derive(Clone)]
pub struct SiteState {
    pub store: Arc<dyn ContentStore>,
    pub mailer: Arc<dyn Mailer>,
    pub pages: PageCache,
    pub site: Arc<ServerConfig>,
    pub mail: Arc<MailConfig>,
}

impl SiteState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        mailer: Arc<dyn Mailer>,
        site: ServerConfig,
        mail: MailConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            pages: PageCache::new(),
            site: Arc::new(site),
            mail: Arc::new(mail),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
struct IndexPage {
    site: Arc<ServerConfig>,
    posts: Vec<Post>,
    reviews: Vec<Review>,
    notice: Option<SubmissionOutcome>,
}

#[derive(Template, WebTemplate)]
#[template(path = "blog.html")]
struct BlogPage {
    site: Arc<ServerConfig>,
    posts: Vec<Post>,
}

#[derive(Template, WebTemplate)]
#[template(path = "post.html")]
struct PostPage<'a> {
    site: Arc<ServerConfig>,
    post: Post,
    body: Arc<str>,
    comment_count: usize,
    thread: Vec<ThreadEntry<'a>>,
    notice: Option<SubmissionOutcome>,
}

struct CategoryLink {
    name: &'static str,
    query: String,
    active: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "gallery.html")]
struct GalleryPage {
    site: Arc<ServerConfig>,
    categories: Vec<CategoryLink>,
    filtered: bool,
    items: Vec<GalleryItem>,
}

#[derive(Template, WebTemplate)]
#[template(path = "works.html")]
struct WorksPage {
    site: Arc<ServerConfig>,
    works: Vec<Work>,
}

#[derive(Template, WebTemplate)]
#[template(path = "work.html")]
struct WorkPage {
    site: Arc<ServerConfig>,
    work: Work,
    body: Arc<str>,
}

#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
struct ContactPage {
    site: Arc<ServerConfig>,
    notice: Option<SubmissionOutcome>,
}

#[derive(Template, WebTemplate)]
#[template(path = "404.html")]
struct ErrorPage {
    site: Arc<ServerConfig>,
}

async fn render_index(
    state: &SiteState,
    notice: Option<SubmissionOutcome>,
) -> Result<IndexPage, SiteError> {
    let mut posts = state.store.posts().await?;
    posts.truncate(HOME_POSTS);
    let reviews = state.store.approved_reviews().await?;

    Ok(IndexPage {
        site: state.site.clone(),
        posts,
        reviews,
        notice,
    })
}

async fn index(State(state): State<SiteState>) -> Result<IndexPage, SiteError> {
    render_index(&state, None).await
}

async fn submit_review(
    State(state): State<SiteState>,
    Form(form): Form<ReviewForm>,
) -> Result<IndexPage, SiteError> {
    let outcome = submit(&*state.store, &state.pages, form, None).await;
    render_index(&state, Some(outcome)).await
}

async fn blog(State(state): State<SiteState>) -> Result<BlogPage, SiteError> {
    Ok(BlogPage {
        site: state.site.clone(),
        posts: state.store.posts().await?,
    })
}

/// Post, cached body, and a freshly read comment thread.
async fn render_post(
    state: &SiteState,
    slug: &str,
    notice: Option<SubmissionOutcome>,
) -> Result<Response, SiteError> {
    let Some(post) = state.store.post_by_slug(slug).await? else {
        return Ok(not_found_page(state));
    };

    let body = state
        .pages
        .get_or_render(&format!("/blog/{slug}"), || markdown::to_html(&post.body))
        .await;
    let thread = load_thread(&*state.store, &post.id).await?;
    let entries = flatten(&thread);

    Ok(PostPage {
        site: state.site.clone(),
        comment_count: entries.len(),
        post,
        body,
        thread: entries,
        notice,
    }
    .into_response())
}

async fn post_page(
    Path(slug): Path<String>,
    State(state): State<SiteState>,
) -> Result<Response, SiteError> {
    render_post(&state, &slug, None).await
}

async fn submit_comment(
    Path(slug): Path<String>,
    State(state): State<SiteState>,
    Form(form): Form<CommentForm>,
) -> Result<Response, SiteError> {
    let origin = format!("/blog/{slug}");
    let outcome = submit(&*state.store, &state.pages, form, Some(&origin)).await;
    render_post(&state, &slug, Some(outcome)).await
}

#[derive(Deserialize)]
struct GalleryFilter {
    #[serde(default)]
    category: Option<String>,
}

async fn gallery(
    Query(filter): Query<GalleryFilter>,
    State(state): State<SiteState>,
) -> Result<GalleryPage, SiteError> {
    let category = filter.category.filter(|c| !c.is_empty());
    let items = state.store.gallery_items(category.as_deref()).await?;
    let categories = CATEGORIES
        .iter()
        .map(|&name| CategoryLink {
            name,
            query: category_query(name),
            active: category.as_deref() == Some(name),
        })
        .collect();

    Ok(GalleryPage {
        site: state.site.clone(),
        categories,
        filtered: category.is_some(),
        items,
    })
}

async fn works(State(state): State<SiteState>) -> Result<WorksPage, SiteError> {
    Ok(WorksPage {
        site: state.site.clone(),
        works: state.store.works().await?,
    })
}

async fn work_page(
    Path(slug): Path<String>,
    State(state): State<SiteState>,
) -> Result<Response, SiteError> {
    let Some(work) = state.store.work_by_slug(&slug).await? else {
        return Ok(not_found_page(&state));
    };
    let body = state
        .pages
        .get_or_render(&format!("/work/{slug}"), || markdown::to_html(&work.body))
        .await;

    Ok(WorkPage {
        site: state.site.clone(),
        work,
        body,
    }
    .into_response())
}

async fn contact_page(State(state): State<SiteState>) -> ContactPage {
    ContactPage {
        site: state.site.clone(),
        notice: None,
    }
}

async fn submit_contact(
    State(state): State<SiteState>,
    Form(form): Form<ContactForm>,
) -> ContactPage {
    let notice = match contact::send(&*state.mailer, &state.mail, &form).await {
        Ok(_) => SubmissionOutcome::success(contact::SENT),
        Err(ContactError::Mail(error)) => {
            tracing::error!(%error, "contact form error");
            SubmissionOutcome::failure("Something went wrong, please try again later.")
        }
        Err(invalid) => SubmissionOutcome::failure(invalid.to_string()),
    };
    ContactPage {
        site: state.site.clone(),
        notice: Some(notice),
    }
}

async fn api_thread(
    Path(post_id): Path<String>,
    State(state): State<SiteState>,
) -> Result<Json<Vec<CommentNode>>, SiteError> {
    Ok(Json(load_thread(&*state.store, &post_id).await?))
}

async fn api_comment(
    State(state): State<SiteState>,
    Json(form): Json<CommentForm>,
) -> Json<SubmissionOutcome> {
    Json(submit(&*state.store, &state.pages, form, None).await)
}

async fn api_review(
    State(state): State<SiteState>,
    Json(form): Json<ReviewForm>,
) -> Json<SubmissionOutcome> {
    Json(submit(&*state.store, &state.pages, form, None).await)
}

async fn api_contact(
    State(state): State<SiteState>,
    Json(form): Json<ContactForm>,
) -> impl IntoResponse {
    match contact::send(&*state.mailer, &state.mail, &form).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "message": contact::SENT }))),
        Err(ContactError::Mail(error)) => {
            tracing::error!(%error, "contact form error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
        }
        Err(invalid) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": invalid.to_string() })),
        ),
    }
}

fn not_found_page(state: &SiteState) -> Response {
    (
        StatusCode::NOT_FOUND,
        ErrorPage {
            site: state.site.clone(),
        },
    )
        .into_response()
}

async fn fallback(State(state): State<SiteState>) -> Response {
    not_found_page(&state)
}

pub fn router(state: SiteState) -> Router {
    Router::new()
        .nest_service("/static", ServeDir::new("static"))
        .route("/", get(index))
        .route("/reviews", post(submit_review))
        .route("/blog", get(blog))
        .route("/blog/{slug}", get(post_page))
        .route("/blog/{slug}/comments", post(submit_comment))
        .route("/gallery", get(gallery))
        .route("/work", get(works))
        .route("/work/{slug}", get(work_page))
        .route("/contact", get(contact_page).post(submit_contact))
        .route("/api/posts/{post_id}/comments", get(api_thread))
        .route("/api/comments", post(api_comment))
        .route("/api/reviews", post(api_review))
        .route("/api/contact", post(api_contact))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: SiteState) -> miette::Result<()> {
    let addr = state.site.addr;
    let listener = TcpListener::bind(addr).await.into_diagnostic()?;
    tracing::info!(%addr, "serving site");
    axum::serve(listener, router(state))
        .await
        .into_diagnostic()?;
    Ok(())
}
