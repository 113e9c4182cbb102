use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::{ContentStore, StoreError};
use crate::{
    comment::{Comment, NewComment},
    config::SanityConfig,
    portfolio::{GalleryItem, Work},
    post::Post,
    review::{NewReview, Review},
};

const POSTS_QUERY: &str = r#"*[_type == "post" && defined(publishedAt)] | order(publishedAt desc) {
  "id": _id, "slug": slug.current, title, excerpt, "body": coalesce(pt::text(body), ""), publishedAt
}"#;

const POST_BY_SLUG_QUERY: &str = r#"*[_type == "post" && slug.current == $slug][0] {
  "id": _id, "slug": slug.current, title, excerpt, "body": coalesce(pt::text(body), ""), publishedAt
}"#;

const APPROVED_COMMENTS_QUERY: &str = r#"*[_type == "comment" && post._ref == $postId && approved == true] | order(_createdAt asc) {
  "id": _id, "postId": post._ref, "parentId": parent._ref, "author": name, "body": comment, "createdAt": _createdAt, approved
}"#;

const APPROVED_REVIEWS_QUERY: &str = r#"*[_type == "kindWords" && approved == true && isSpam != true] | order(_createdAt desc) {
  "id": _id, name, role, content, "createdAt": _createdAt
}"#;

const GALLERY_PROJECTION: &str = r#"{
  "id": _id, "title": coalesce(title, ""), category, medium,
  "mediaType": coalesce(mediaType, "photo"), "imageUrl": image.asset->url, "alt": image.alt,
  "caption": image.caption, "videoUrl": videoEmbedUrl, "featured": coalesce(featured, false),
  "createdAt": _createdAt
}"#;

const GALLERY_FILTER: &str = r#"*[_type == "galleryAsset" && archived != true]"#;

const GALLERY_BY_CATEGORY_FILTER: &str =
    r#"*[_type == "galleryAsset" && category == $category && archived != true]"#;

const WORKS_QUERY: &str = r#"*[_type == "work"] | order(year desc, _createdAt desc) {
  "id": _id, "slug": slug.current, title, year, excerpt, "coverUrl": coverImage.asset->url,
  "featured": coalesce(featured, false), "tags": coalesce(tags, []), "createdAt": _createdAt
}"#;

const WORK_BY_SLUG_QUERY: &str = r#"*[_type == "work" && slug.current == $slug][0] {
  "id": _id, "slug": slug.current, title, year, excerpt, "body": coalesce(pt::text(body), ""),
  "coverUrl": coverImage.asset->url, "featured": coalesce(featured, false),
  "tags": coalesce(tags, []), "gallery": coalesce(gallery[].asset->url, []),
  "createdAt": _createdAt
}"#;

fn gallery_query(filter: &str) -> String {
    format!("{filter} | order(_createdAt desc) {GALLERY_PROJECTION}")
}

/// Headless CMS over its HTTP API. Reads always bypass the CDN.
pub struct SanityStore {
    client: Client,
    config: SanityConfig,
    base: String,
}

#[derive(Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutateResult>,
}

#[derive(Deserialize)]
struct MutateResult {
    id: String,
}

#[derive(Serialize)]
struct Mutations<'a, D> {
    mutations: [Mutation<'a, D>; 1],
}

#[derive(Serialize)]
struct Mutation<'a, D> {
    create: &'a D,
}

#[derive(Serialize)]
struct Reference<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    #[serde(rename = "_ref")]
    target: &'a str,
}

impl<'a> Reference<'a> {
    fn to(target: &'a str) -> Self {
        Self {
            kind: "reference",
            target,
        }
    }
}

#[derive(Serialize)]
struct CommentDocument<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    post: Reference<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<Reference<'a>>,
    name: &'a str,
    comment: &'a str,
    approved: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewDocument<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    name: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    content: &'a str,
    approved: bool,
    is_spam: bool,
}

impl SanityStore {
    pub fn new(config: SanityConfig) -> Self {
        let host = config
            .api_host
            .clone()
            .unwrap_or_else(|| format!("https://{}.api.sanity.io", config.project_id));
        let base = format!("{}/v{}", host.trim_end_matches('/'), config.api_version);
        Self {
            client: Client::new(),
            config,
            base,
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, &str)],
    ) -> Result<T, StoreError> {
        let mut query = vec![("query".to_string(), groq.to_string())];
        // GROQ parameters travel as JSON literals.
        query.extend(
            params
                .iter()
                .map(|(name, value)| (format!("${name}"), Value::from(*value).to_string())),
        );

        let mut request = self
            .client
            .get(format!("{}/data/query/{}", self.base, self.config.dataset))
            .query(&query);
        if let Some(token) = &self.config.read_token {
            request = request.bearer_auth(token);
        }

        let response: QueryResponse<T> = read(request.send().await?).await?;
        Ok(response.result)
    }

    async fn create<D: Serialize>(&self, document: &D) -> Result<String, StoreError> {
        let token = self
            .config
            .write_token
            .as_deref()
            .ok_or(StoreError::MissingCredential)?;

        let response = self
            .client
            .post(format!("{}/data/mutate/{}", self.base, self.config.dataset))
            .query(&[("returnIds", "true")])
            .bearer_auth(token)
            .json(&Mutations {
                mutations: [Mutation { create: document }],
            })
            .send()
            .await?;

        let body: MutateResponse = read(response).await?;
        body.results
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| StoreError::Malformed("mutation returned no document id".to_string()))
    }
}

/// Decodes a success body, or turns the API's error payload into a
/// `StoreError::Status` carrying its description.
async fn read<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| {
            v.pointer("/error/description")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(text);
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ContentStore for SanityStore {
    fn has_write_credential(&self) -> bool {
        self.config
            .write_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    async fn posts(&self) -> Result<Vec<Post>, StoreError> {
        self.query(POSTS_QUERY, &[]).await
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        self.query(POST_BY_SLUG_QUERY, &[("slug", slug)]).await
    }

    async fn approved_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        self.query(APPROVED_COMMENTS_QUERY, &[("postId", post_id)])
            .await
    }

    async fn approved_reviews(&self) -> Result<Vec<Review>, StoreError> {
        self.query(APPROVED_REVIEWS_QUERY, &[]).await
    }

    async fn gallery_items(&self, category: Option<&str>) -> Result<Vec<GalleryItem>, StoreError> {
        match category {
            Some(category) => {
                let groq = gallery_query(GALLERY_BY_CATEGORY_FILTER);
                self.query(&groq, &[("category", category)]).await
            }
            None => self.query(&gallery_query(GALLERY_FILTER), &[]).await,
        }
    }

    async fn works(&self) -> Result<Vec<Work>, StoreError> {
        self.query(WORKS_QUERY, &[]).await
    }

    async fn work_by_slug(&self, slug: &str) -> Result<Option<Work>, StoreError> {
        self.query(WORK_BY_SLUG_QUERY, &[("slug", slug)]).await
    }

    async fn create_comment(&self, comment: NewComment) -> Result<String, StoreError> {
        self.create(&CommentDocument {
            kind: "comment",
            post: Reference::to(&comment.post_id),
            parent: comment.parent_id.as_deref().map(Reference::to),
            name: &comment.author,
            comment: &comment.body,
            approved: false,
        })
        .await
    }

    async fn create_review(&self, review: NewReview) -> Result<String, StoreError> {
        self.create(&ReviewDocument {
            kind: "kindWords",
            name: &review.name,
            email: &review.email,
            role: review.role.as_deref(),
            content: &review.content,
            approved: false,
            is_spam: false,
        })
        .await
    }
}
