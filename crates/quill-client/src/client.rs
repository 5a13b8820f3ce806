//! Typed client for the Quill REST API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use quill_core::ports::Cache;
use quill_infra::InMemoryCache;
use quill_shared::MessageResponse;
use quill_shared::dto::{
    AuthResponse, CategoryEnvelope, CategoryListResponse, CategoryResponse, CommentEnvelope,
    CommentListResponse, CommentResponse, CreateCategoryRequest, CreateCommentRequest,
    HealthResponse, LoginRequest, PostEnvelope, PostListQuery, PostListResponse, PostResponse, RegisterRequest,
    UpdatePostRequest, UpdateProfileRequest, UploadResponse, UserEnvelope, UserResponse,
};

use crate::error::{ClientError, ClientResult};
use crate::keys;

/// An image to send in a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Fields of the create-post form.
#[derive(Debug, Clone, Default)]
pub struct NewPostForm {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    /// `draft`, `published` or `archived`; the server defaults to draft.
    pub status: Option<String>,
    pub featured: bool,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub image: Option<ImageUpload>,
}

impl NewPostForm {
    fn into_form(self) -> ClientResult<Form> {
        let mut form = Form::new()
            .text("title", self.title)
            .text("content", self.content)
            .text("category", self.category)
            .text("featured", self.featured.to_string());

        let optional = [
            ("excerpt", self.excerpt),
            ("status", self.status),
            ("seoTitle", self.seo_title),
            ("seoDescription", self.seo_description),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                form = form.text(name, value);
            }
        }
        for tag in self.tags {
            form = form.text("tags[]", tag);
        }
        if let Some(image) = self.image {
            form = form.part("image", image.into_part()?);
        }

        Ok(form)
    }
}

impl ImageUpload {
    fn into_part(self) -> ClientResult<Part> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?)
    }
}

/// A GET whose response body every caller of the same key awaits.
type Flight = Shared<BoxFuture<'static, ClientResult<String>>>;

/// REST client with a query-keyed response cache.
///
/// Reads go through the cache, and concurrent reads of one key share a
/// single request. Mutations invalidate the keys they affect. The bearer
/// token from `login`/`register` is kept for later calls.
pub struct BlogClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
    cache: Arc<dyn Cache>,
    inflight: Mutex<HashMap<String, Flight>>,
    ttl: Option<Duration>,
}

impl BlogClient {
    /// Client for the API at `base_url` (e.g. `http://localhost:5001`) with
    /// an in-memory cache.
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        Self::with_cache(base_url, Arc::new(InMemoryCache::new()))
    }

    pub fn with_cache(base_url: impl Into<String>, cache: Arc<dyn Cache>) -> ClientResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::BaseUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
            cache,
            inflight: Mutex::new(HashMap::new()),
            ttl: None,
        })
    }

    /// Expire cached reads after `ttl` instead of keeping them until
    /// invalidated.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        self.fetch(self.request(Method::GET, "/api/health").await).await
    }

    // ---- auth ----

    pub async fn register(&self, req: &RegisterRequest) -> ClientResult<AuthResponse> {
        let res: AuthResponse = self.send_json(Method::POST, "/api/auth/register", req).await?;
        self.set_token(Some(res.token.clone())).await;
        Ok(res)
    }

    pub async fn login(&self, req: &LoginRequest) -> ClientResult<AuthResponse> {
        let res: AuthResponse = self.send_json(Method::POST, "/api/auth/login", req).await?;
        self.set_token(Some(res.token.clone())).await;
        Ok(res)
    }

    /// Forget the token. Cached public reads are kept.
    pub async fn logout(&self) {
        self.set_token(None).await;
    }

    pub async fn profile(&self) -> ClientResult<UserResponse> {
        let res: UserEnvelope = self.fetch(self.request(Method::GET, "/api/auth/profile").await).await?;
        Ok(res.user)
    }

    pub async fn update_profile(&self, req: &UpdateProfileRequest) -> ClientResult<UserResponse> {
        let res: UserEnvelope = self.send_json(Method::PUT, "/api/auth/profile", req).await?;
        Ok(res.user)
    }

    // ---- posts ----

    pub async fn posts(&self, query: &PostListQuery) -> ClientResult<PostListResponse> {
        let builder = self.request(Method::GET, "/api/posts").await.query(query);
        self.query(&keys::post_list(query), builder).await
    }

    pub async fn post(&self, id: Uuid) -> ClientResult<PostResponse> {
        let builder = self.request(Method::GET, &format!("/api/posts/{id}")).await;
        let res: PostEnvelope = self.query(&keys::post_detail(id), builder).await?;
        Ok(res.post)
    }

    pub async fn create_post(&self, form: NewPostForm) -> ClientResult<PostResponse> {
        let builder = self
            .request(Method::POST, "/api/posts")
            .await
            .multipart(form.into_form()?);
        let res: PostEnvelope = self.fetch(builder).await?;
        self.invalidate_post(res.post.id).await?;
        Ok(res.post)
    }

    pub async fn update_post(&self, id: Uuid, req: &UpdatePostRequest) -> ClientResult<PostResponse> {
        let res: PostEnvelope = self
            .send_json(Method::PUT, &format!("/api/posts/{id}"), req)
            .await?;
        self.invalidate_post(id).await?;
        Ok(res.post)
    }

    pub async fn delete_post(&self, id: Uuid) -> ClientResult<MessageResponse> {
        let path = format!("/api/posts/{id}");
        let res: MessageResponse = self.fetch(self.request(Method::DELETE, &path).await).await?;
        self.invalidate_post(id).await?;
        Ok(res)
    }

    // ---- categories ----

    pub async fn categories(&self) -> ClientResult<Vec<CategoryResponse>> {
        let builder = self.request(Method::GET, "/api/categories").await;
        let res: CategoryListResponse = self.query(keys::CATEGORIES, builder).await?;
        Ok(res.categories)
    }

    pub async fn create_category(&self, req: &CreateCategoryRequest) -> ClientResult<CategoryResponse> {
        let res: CategoryEnvelope = self.send_json(Method::POST, "/api/categories", req).await?;
        self.forget(keys::CATEGORIES).await?;
        Ok(res.category)
    }

    // ---- comments ----

    pub async fn comments(&self, post_id: Uuid) -> ClientResult<Vec<CommentResponse>> {
        let path = format!("/api/comments/post/{post_id}");
        let builder = self.request(Method::GET, &path).await;
        let res: CommentListResponse = self.query(&keys::comments(post_id), builder).await?;
        Ok(res.comments)
    }

    pub async fn create_comment(&self, req: &CreateCommentRequest) -> ClientResult<CommentResponse> {
        let res: CommentEnvelope = self.send_json(Method::POST, "/api/comments", req).await?;
        self.forget(&keys::comments(req.post)).await?;
        Ok(res.comment)
    }

    // ---- uploads ----

    pub async fn upload_image(&self, image: ImageUpload) -> ClientResult<UploadResponse> {
        let form = Form::new().part("image", image.into_part()?);
        let builder = self
            .request(Method::POST, "/api/upload/image")
            .await
            .multipart(form);
        self.fetch(builder).await
    }

    // ---- plumbing ----

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path).await.json(body);
        self.fetch(builder).await
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let body = send(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Cached GET. A miss joins the request already running for `key`, or
    /// starts one; the first caller to finish fills the cache.
    async fn query<T: DeserializeOwned>(&self, key: &str, builder: RequestBuilder) -> ClientResult<T> {
        if let Some(raw) = self.cache.get(key).await {
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::trace!(key, "Cache hit");
                    return Ok(value);
                }
                Err(e) => tracing::warn!(key, "Dropping unreadable cache entry: {}", e),
            }
        }

        let flight = self
            .inflight
            .lock()
            .await
            .entry(key.to_string())
            .or_insert_with(|| send(builder).boxed().shared())
            .clone();
        let result = flight.clone().await;

        {
            // Only the registered flight may fill the cache; an invalidation
            // while it ran has already unregistered it.
            let mut inflight = self.inflight.lock().await;
            if inflight.get(key).is_some_and(|f| f.ptr_eq(&flight)) {
                inflight.remove(key);
                if let Ok(raw) = &result {
                    self.store(key, raw).await;
                }
            }
        }

        Ok(serde_json::from_str(&result?)?)
    }

    // A failed cache write only costs a refetch.
    async fn store(&self, key: &str, raw: &str) {
        if let Err(e) = self.cache.set(key, raw, self.ttl).await {
            tracing::warn!(key, "Cache write failed: {}", e);
        }
    }

    async fn forget(&self, key: &str) -> ClientResult<()> {
        self.inflight.lock().await.remove(key);
        self.cache.delete(key).await?;
        Ok(())
    }

    /// Drop every post listing and the detail entry of `id`.
    async fn invalidate_post(&self, id: Uuid) -> ClientResult<()> {
        self.inflight
            .lock()
            .await
            .retain(|key, _| !key.starts_with(keys::POST_LISTS));
        let dropped = self.cache.delete_prefix(keys::POST_LISTS).await?;
        self.forget(&keys::post_detail(id)).await?;
        tracing::debug!(post_id = %id, dropped, "Invalidated post queries");
        Ok(())
    }
}

/// Send a request and return the success body, or turn an error body into
/// [`ClientError::Api`].
async fn send(builder: RequestBuilder) -> ClientResult<String> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(api_error(status, &body))
    }
}

fn api_error(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}
