use std::path::Path;
use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use quill_infra::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryPostRepository,
    InMemoryUserRepository, JwtConfig, UploadConfig,
};
use quill_shared::ErrorResponse;
use quill_shared::dto::{
    AuthResponse, CategoryEnvelope, CategoryListResponse, CommentEnvelope, CommentListResponse,
    PostEnvelope, PostListResponse, PostResponse, UploadResponse, UserEnvelope,
};

use super::configure_routes;
use crate::middleware::error::{json_config, path_config, query_config};
use crate::observability::RequestIdMiddleware;
use crate::state::{AppState, Repositories};

const BOUNDARY: &str = "quill-test-boundary";

struct Fixture {
    state: AppState,
    users: Arc<InMemoryUserRepository>,
    upload_dir: std::path::PathBuf,
    _tmp: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let upload_dir = tmp.path().join("uploads");
    let users = Arc::new(InMemoryUserRepository::new());

    let repos = Repositories {
        users: users.clone(),
        posts: Arc::new(InMemoryPostRepository::new()),
        categories: Arc::new(InMemoryCategoryRepository::new()),
        comments: Arc::new(InMemoryCommentRepository::new()),
    };
    let upload = UploadConfig {
        dir: upload_dir.clone(),
        public_base_url: "http://blog.test".to_string(),
        max_bytes: 1024,
    };

    Fixture {
        state: AppState::build(repos, JwtConfig::default(), &upload),
        users,
        upload_dir,
        _tmp: tmp,
    }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state.clone()))
                .app_data(json_config())
                .app_data(query_config())
                .app_data(path_config())
                .configure(configure_routes),
        )
        .await
    };
}

macro_rules! register {
    ($app:expr, $name:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "name": $name, "email": $email, "password": "secret-pw" }))
            .to_request();
        let body: AuthResponse = test::call_and_read_body_json(&$app, req).await;
        body
    }};
}

macro_rules! create_post {
    ($app:expr, $token:expr, $fields:expr) => {{
        let (content_type, payload) = multipart_body($fields, None);
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&$token))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: PostEnvelope = test::read_body_json(resp).await;
        body.post
    }};
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

fn published(title: &str) -> Vec<(&str, &str)> {
    vec![
        ("title", title),
        ("content", "<p>Hello there</p>"),
        ("category", "Technology"),
        ("status", "published"),
        ("tags", "rust, web"),
    ]
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[actix_web::test]
async fn test_health() {
    let fx = fixture();
    let app = app!(fx.state);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_register_twice_is_rejected_without_new_user() {
    let fx = fixture();
    let app = app!(fx.state);

    let first = register!(app, "Ada", "ada@example.com");
    assert_eq!(first.message, "User created successfully");
    assert_eq!(first.user.email, "ada@example.com");
    assert_eq!(first.user.role, "user");

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "name": "Ada Again", "email": "ADA@example.com", "password": "x" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.message, "User already exists");
    assert_eq!(fx.users.count().await, 1);
}

#[actix_web::test]
async fn test_register_response_never_contains_password() {
    let fx = fixture();
    let app = app!(fx.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "name": "Ada", "email": "ada@example.com", "password": "secret-pw" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let user = body["user"].as_object().unwrap();
    assert!(!user.contains_key("password"));
    assert!(!user.contains_key("passwordHash"));
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[actix_web::test]
async fn test_login_checks_credentials() {
    let fx = fixture();
    let app = app!(fx.state);
    register!(app, "Ada", "ada@example.com");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": "secret-pw" }))
        .to_request();
    let body: AuthResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.message, "Login successful");

    for (email, password) in [("ada@example.com", "wrong"), ("bob@example.com", "secret-pw")] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Invalid credentials");
    }
}

#[actix_web::test]
async fn test_profile_requires_valid_token() {
    let fx = fixture();
    let app = app!(fx.state);

    let req = test::TestRequest::get().uri("/api/auth/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.message, "Access token required");

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(bearer("not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.message, "Invalid or expired token");
}

#[actix_web::test]
async fn test_profile_update_ignores_role_and_email() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");

    let req = test::TestRequest::put()
        .uri("/api/auth/profile")
        .insert_header(bearer(&auth.token))
        .set_json(json!({
            "name": "Ada Lovelace",
            "bio": "Analyst",
            "role": "admin",
            "email": "evil@example.com",
            "socialLinks": { "github": "ada" }
        }))
        .to_request();
    let body: UserEnvelope = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.user.name, "Ada Lovelace");
    assert_eq!(body.user.bio.as_deref(), Some("Analyst"));
    assert_eq!(body.user.role, "user");
    assert_eq!(body.user.email, "ada@example.com");
    assert_eq!(body.user.social_links.github.as_deref(), Some("ada"));

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(bearer(&auth.token))
        .to_request();
    let body: UserEnvelope = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.user.name, "Ada Lovelace");
}

#[actix_web::test]
async fn test_create_post_derives_fields() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");

    let post = create_post!(app, auth.token, &published("Hello, World!!"));

    assert_eq!(post.slug, "hello-world");
    assert_eq!(post.read_time, 1);
    assert_eq!(post.status, "published");
    assert!(post.published_at.is_some());
    assert_eq!(post.tags, vec!["rust", "web"]);
    assert_eq!(post.author.as_ref().map(|a| a.id), Some(auth.user.id));
}

#[actix_web::test]
async fn test_create_post_requires_auth() {
    let fx = fixture();
    let app = app!(fx.state);

    let (content_type, payload) = multipart_body(&published("Anonymous"), None);
    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_post_with_image_stores_file() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");

    let (content_type, payload) =
        multipart_body(&published("With a picture"), Some(("cat.png", "image/png", &b"png"[..])));
    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&auth.token))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(payload)
        .to_request();
    let body: PostEnvelope = test::call_and_read_body_json(&app, req).await;

    let image = body.post.image.unwrap();
    assert!(image.starts_with("/uploads/image-"));
    assert!(image.ends_with(".png"));
    assert_eq!(files_in(&fx.upload_dir), 1);
}

#[actix_web::test]
async fn test_create_post_with_existing_image_path() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");

    let mut fields = published("Reused picture");
    fields.push(("image", "/uploads/existing.png"));
    let post = create_post!(app, auth.token, &fields);

    assert_eq!(post.image.as_deref(), Some("/uploads/existing.png"));
    assert_eq!(files_in(&fx.upload_dir), 0);
}

#[actix_web::test]
async fn test_invalid_post_leaves_no_file() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");

    let (content_type, payload) = multipart_body(
        &[("content", "no title"), ("category", "Technology")],
        Some(("cat.png", "image/png", &b"png"[..])),
    );
    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&auth.token))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(files_in(&fx.upload_dir), 0);
}

#[actix_web::test]
async fn test_each_get_counts_one_view() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");
    let post = create_post!(app, auth.token, &published("Counted"));

    let mut seen = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{}", post.id))
            .to_request();
        let body: PostEnvelope = test::call_and_read_body_json(&app, req).await;
        seen.push(body.post.views);
    }

    assert_eq!(seen, vec![post.views + 1, post.views + 2]);
}

#[actix_web::test]
async fn test_missing_and_malformed_post_ids() {
    let fx = fixture();
    let app = app!(fx.state);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.message, "Post not found");

    let req = test::TestRequest::get().uri("/api/posts/not-a-uuid").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_only_the_author_may_change_a_post() {
    let fx = fixture();
    let app = app!(fx.state);
    let ada = register!(app, "Ada", "ada@example.com");
    let bob = register!(app, "Bob", "bob@example.com");
    let post = create_post!(app, ada.token, &published("Mine"));
    let uri = format!("/api/posts/{}", post.id);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&bob.token))
        .set_json(json!({ "title": "Stolen" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&bob.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&ada.token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Post deleted successfully");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&ada.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_retitling_keeps_published_at() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");
    let post = create_post!(app, auth.token, &published("First title"));

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(&auth.token))
        .set_json(json!({ "title": "Second title", "status": "published" }))
        .to_request();
    let body: PostEnvelope = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.post.slug, "second-title");
    assert_eq!(body.post.published_at, post.published_at);
}

#[actix_web::test]
async fn test_update_rejects_unknown_status() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");
    let post = create_post!(app, auth.token, &published("Status"));

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(&auth.token))
        .set_json(json!({ "status": "deleted" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_list_shows_published_posts_with_paging_and_search() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");

    create_post!(app, auth.token, &published("Learning Rust"));
    create_post!(app, auth.token, &published("Baking bread"));
    create_post!(
        app,
        auth.token,
        &[("title", "Secret"), ("content", "draft"), ("category", "Food")]
    );

    let req = test::TestRequest::get().uri("/api/posts?limit=1").to_request();
    let body: PostListResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.total, 2);
    assert_eq!(body.pages, 2);
    assert_eq!(body.page, 1);
    assert_eq!(body.posts.len(), 1);
    assert!(body.posts[0].author.is_some());

    let req = test::TestRequest::get().uri("/api/posts?search=RUST").to_request();
    let body: PostListResponse = test::call_and_read_body_json(&app, req).await;
    let titles: Vec<&str> = body.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Learning Rust"]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts?author={}&category=Food", auth.user.id))
        .to_request();
    let body: PostListResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.total, 0);
}

#[actix_web::test]
async fn test_list_sorted_by_views() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");

    create_post!(app, auth.token, &published("Quiet"));
    let busy: PostResponse = create_post!(app, auth.token, &published("Busy"));
    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", busy.id))
        .to_request();
    test::call_service(&app, req).await;

    for sort in ["popular", "views"] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/posts?sort={sort}"))
            .to_request();
        let body: PostListResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.posts[0].id, busy.id);
    }
}

#[actix_web::test]
async fn test_list_with_huge_page_is_empty() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");
    create_post!(app, auth.token, &published("Only post"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts?page={}&limit=10", u64::MAX))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: PostListResponse = test::read_body_json(resp).await;
    assert!(body.posts.is_empty());
    assert_eq!(body.total, 1);
    assert_eq!(body.page, quill_core::domain::PostQuery::MAX_PAGE);
}

#[actix_web::test]
async fn test_categories_are_unique_and_sorted() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");

    for name in ["Travel", "Food"] {
        let req = test::TestRequest::post()
            .uri("/api/categories")
            .insert_header(bearer(&auth.token))
            .set_json(json!({ "name": name }))
            .to_request();
        let body: CategoryEnvelope = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.category.color, "#3B82F6");
    }

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header(bearer(&auth.token))
        .set_json(json!({ "name": "Food" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.message, "Category already exists");

    let req = test::TestRequest::get().uri("/api/categories").to_request();
    let body: CategoryListResponse = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = body.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Food", "Travel"]);
}

#[actix_web::test]
async fn test_comments_on_existing_posts() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");
    let post = create_post!(app, auth.token, &published("Discussed"));

    let req = test::TestRequest::post()
        .uri("/api/comments")
        .insert_header(bearer(&auth.token))
        .set_json(json!({ "content": "Ghost", "post": uuid::Uuid::new_v4() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/comments")
        .insert_header(bearer(&auth.token))
        .set_json(json!({ "content": " First! ", "post": post.id }))
        .to_request();
    let first: CommentEnvelope = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first.comment.content, "First!");
    assert!(first.comment.is_approved);

    let req = test::TestRequest::post()
        .uri("/api/comments")
        .insert_header(bearer(&auth.token))
        .set_json(json!({
            "content": "A reply",
            "post": post.id,
            "parentComment": first.comment.id
        }))
        .to_request();
    let reply: CommentEnvelope = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reply.comment.parent_comment, Some(first.comment.id));

    let req = test::TestRequest::get()
        .uri(&format!("/api/comments/post/{}", post.id))
        .to_request();
    let body: CommentListResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.comments.len(), 2);
    assert_eq!(body.comments[0].id, reply.comment.id);
    assert_eq!(
        body.comments[0].author.as_ref().map(|a| a.name.as_str()),
        Some("Ada")
    );
}

#[actix_web::test]
async fn test_upload_accepts_images() {
    let fx = fixture();
    let app = app!(fx.state);

    let (content_type, payload) = multipart_body(&[], Some(("photo.JPG", "image/jpeg", &b"jpeg"[..])));
    let req = test::TestRequest::post()
        .uri("/api/upload/image")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(payload)
        .to_request();
    let body: UploadResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.message, "File uploaded successfully");
    assert!(body.url.starts_with("http://blog.test/uploads/image-"));
    assert!(body.url.ends_with(".jpg"));
    assert_eq!(files_in(&fx.upload_dir), 1);
}

#[actix_web::test]
async fn test_upload_rejections_persist_nothing() {
    let fx = fixture();
    let app = app!(fx.state);
    let too_big = vec![0u8; 2048];

    let cases: Vec<Option<(&str, &str, &[u8])>> = vec![
        Some(("notes.txt", "text/plain", &b"hello"[..])),
        Some(("huge.png", "image/png", too_big.as_slice())),
        None,
    ];

    for file in cases {
        let (content_type, payload) = multipart_body(&[("note", "x")], file);
        let req = test::TestRequest::post()
            .uri("/api/upload/image")
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    assert_eq!(files_in(&fx.upload_dir), 0);
}

#[actix_web::test]
async fn test_oversized_forms_are_rejected() {
    let fx = fixture();
    let app = app!(fx.state);
    let auth = register!(app, "Ada", "ada@example.com");

    let names: Vec<String> = (0..200).map(|i| format!("note{i}")).collect();
    let many: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "x")).collect();
    let long_text = "a".repeat(super::multipart::TEXT_LIMIT / 2 + 1);
    let heavy = vec![("content", long_text.as_str()), ("excerpt", long_text.as_str())];

    for (uri, fields) in [("/api/upload/image", &many), ("/api/posts", &heavy)] {
        let (content_type, payload) =
            multipart_body(fields, Some(("cat.png", "image/png", &b"png"[..])));
        let req = test::TestRequest::post()
            .uri(uri)
            .insert_header(bearer(&auth.token))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
    }

    assert_eq!(files_in(&fx.upload_dir), 0);
}

#[actix_web::test]
async fn test_error_bodies_carry_request_id() {
    let fx = fixture();
    let app = app!(fx.state);

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(("X-Request-ID", "req-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(
        resp.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-123")
    );
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.request_id.as_deref(), Some("req-123"));
    assert_eq!(body.status, 401);
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let fx = fixture();
    let app = app!(fx.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.status, 400);
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_auth_routes_are_throttled() {
    use quill_infra::{InMemoryRateLimiter, RateLimitConfig};

    let fx = fixture();
    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 1,
        window: std::time::Duration::from_secs(60),
    })
    .unwrap();
    let state = AppState {
        rate_limiter: Some(Arc::new(limiter)),
        ..fx.state.clone()
    };
    let app = app!(state);

    let login = || {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "nobody@example.com", "password": "x"}))
            .to_request()
    };

    let first = test::call_service(&app, login()).await;
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);
    assert_eq!(first.headers().get("x-ratelimit-remaining").unwrap(), "0");

    let second = test::call_service(&app, login()).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key(header::RETRY_AFTER));

    // Other scopes are not limited
    let health = test::TestRequest::get().uri("/api/health").to_request();
    assert_eq!(test::call_service(&app, health).await.status(), StatusCode::OK);
}
