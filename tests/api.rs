//! Router-level tests exercising the public API against an in-memory
//! store and a temporary content directory.

use std::io::Cursor;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use cornice::application::{
    engagement::EngagementService,
    gallery::GalleryService,
    ingest::IngestService,
    repos::{EngagementRepo, ImagesRepo, NewImage},
};
use cornice::infra::{
    db::SqliteRepositories,
    http::{GalleryState, build_router},
    storage::ContentStorage,
};

const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
const MAX_WIDTH: u32 = 1024;
const PAGE_SIZE: u32 = 18;
const BOUNDARY: &str = "cornice-test-boundary";

struct TestApp {
    router: Router,
    repos: Arc<SqliteRepositories>,
    content_dir: TempDir,
}

async fn build_app() -> TestApp {
    let pool = SqliteRepositories::connect("sqlite::memory:", 1)
        .await
        .expect("connect in-memory sqlite");
    SqliteRepositories::run_migrations(&pool)
        .await
        .expect("run migrations");

    let repos = Arc::new(SqliteRepositories::new(pool));
    let content_dir = TempDir::new().expect("create tempdir");
    let storage =
        Arc::new(ContentStorage::new(content_dir.path().to_path_buf()).expect("create storage"));

    let images: Arc<dyn ImagesRepo> = repos.clone();
    let engagement: Arc<dyn EngagementRepo> = repos.clone();

    let state = GalleryState {
        ingest: Arc::new(IngestService::new(
            images.clone(),
            storage.clone(),
            MAX_UPLOAD_BYTES,
            MAX_WIDTH,
        )),
        gallery: Arc::new(GalleryService::new(
            images,
            NonZeroU32::new(PAGE_SIZE).expect("page size"),
        )),
        engagement: Arc::new(EngagementService::new(engagement)),
        storage,
        db: repos.clone(),
    };

    TestApp {
        router: build_router(state, MAX_UPLOAD_BYTES),
        repos,
        content_dir,
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([120, 40, 200, 128]));
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("encode png");
    buffer.into_inner()
}

fn upload_request(bytes: &[u8], mime: &str, filename: &str, title: &str) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
             filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(
        format!(
            "\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n\
             {title}\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("build request")
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

async fn seed_images(repos: &SqliteRepositories, count: usize) {
    for index in 0..count {
        repos
            .insert_image(NewImage {
                filename: format!("seed-{index}.png"),
                filepath: format!("content/seed-{index}.png"),
                title: Some(format!("seed {index}")),
                description: None,
            })
            .await
            .expect("insert seed image");
    }
}

async fn scalar(repos: &SqliteRepositories, query: &str) -> i64 {
    sqlx::query_scalar(query)
        .fetch_one(repos.pool())
        .await
        .expect("scalar query")
}

#[tokio::test]
async fn upload_appears_in_listing_with_empty_tallies() {
    let app = build_app().await;

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            &png_bytes(64, 48),
            "image/png",
            "sunset.png",
            "Sunset",
        ))
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["success"], Value::Bool(true));
    assert_eq!(body["image_id"], 1);

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/images?page=1"))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], Value::Bool(true));
    assert_eq!(body["total"], 1);
    assert_eq!(body["per_page"], 18);

    let images = body["images"].as_array().expect("images array");
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["title"], "Sunset");
    assert_eq!(images[0]["vote_count"], 0);
    assert_eq!(images[0]["comment_count"], 0);
    assert_eq!(
        images[0]["average_rating"],
        Value::Null,
        "an unrated image must not report a zero rating"
    );
    assert!(
        images[0]["filepath"]
            .as_str()
            .expect("filepath")
            .starts_with("content/")
    );
}

#[tokio::test]
async fn listing_pages_are_capped_and_past_the_end_is_empty() {
    let app = build_app().await;
    seed_images(&app.repos, 20).await;

    let body = json_body(
        app.router
            .clone()
            .oneshot(get_request("/api/images?page=1"))
            .await
            .expect("page 1"),
    )
    .await;
    let first_page = body["images"].as_array().expect("images");
    assert_eq!(first_page.len(), 18);
    assert_eq!(body["total"], 20);
    // Newest first: the last inserted image leads the listing.
    assert_eq!(first_page[0]["id"], 20);

    let body = json_body(
        app.router
            .clone()
            .oneshot(get_request("/api/images?page=2"))
            .await
            .expect("page 2"),
    )
    .await;
    assert_eq!(body["images"].as_array().expect("images").len(), 2);
    assert_eq!(body["total"], 20);

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/images?page=9"))
        .await
        .expect("page past the end");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], Value::Bool(true));
    assert!(body["images"].as_array().expect("images").is_empty());
}

#[tokio::test]
async fn missing_page_parameter_defaults_to_the_first_page() {
    let app = build_app().await;
    seed_images(&app.repos, 2).await;

    let body = json_body(
        app.router
            .clone()
            .oneshot(get_request("/api/images"))
            .await
            .expect("list"),
    )
    .await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["images"].as_array().expect("images").len(), 2);
}

#[tokio::test]
async fn out_of_range_votes_leave_no_rows() {
    let app = build_app().await;
    seed_images(&app.repos, 1).await;

    for value in [0, 6] {
        let response = app
            .router
            .clone()
            .oneshot(form_request("/api/vote", &format!("image_id=1&value={value}")))
            .await
            .expect("vote");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "value {value}");
        let body = json_body(response).await;
        assert_eq!(body["success"], Value::Bool(false));
    }

    assert_eq!(scalar(&app.repos, "SELECT COUNT(*) FROM votes").await, 0);
}

#[tokio::test]
async fn ratings_average_to_one_decimal() {
    let app = build_app().await;
    seed_images(&app.repos, 1).await;

    for value in [3, 4, 4] {
        let response = app
            .router
            .clone()
            .oneshot(form_request("/api/vote", &format!("image_id=1&value={value}")))
            .await
            .expect("vote");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], Value::Bool(true));
    }

    let body = json_body(
        app.router
            .clone()
            .oneshot(get_request("/api/images?page=1"))
            .await
            .expect("list"),
    )
    .await;
    let image = &body["images"].as_array().expect("images")[0];
    assert_eq!(image["vote_count"], 3);
    // 11 / 3 = 3.666… rounds to one decimal.
    assert_eq!(image["average_rating"], 3.7);
}

#[tokio::test]
async fn votes_against_unknown_images_are_rejected() {
    let app = build_app().await;

    let response = app
        .router
        .clone()
        .oneshot(form_request("/api/vote", "image_id=999&value=3"))
        .await
        .expect("vote");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(scalar(&app.repos, "SELECT COUNT(*) FROM votes").await, 0);
}

#[tokio::test]
async fn comment_length_boundary_is_enforced() {
    let app = build_app().await;
    seed_images(&app.repos, 1).await;

    let over = "x".repeat(501);
    let response = app
        .router
        .clone()
        .oneshot(form_request(
            "/api/comment",
            &format!("image_id=1&content={over}"),
        ))
        .await
        .expect("comment");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(scalar(&app.repos, "SELECT COUNT(*) FROM comments").await, 0);

    let exact = "x".repeat(500);
    let response = app
        .router
        .clone()
        .oneshot(form_request(
            "/api/comment",
            &format!("image_id=1&content={exact}"),
        ))
        .await
        .expect("comment");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(scalar(&app.repos, "SELECT COUNT(*) FROM comments").await, 1);
}

#[tokio::test]
async fn blank_comment_authors_become_anonymous() {
    let app = build_app().await;
    seed_images(&app.repos, 1).await;

    let response = app
        .router
        .clone()
        .oneshot(form_request(
            "/api/comment",
            "image_id=1&author=&content=lovely+shot",
        ))
        .await
        .expect("comment");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(
        app.router
            .clone()
            .oneshot(get_request("/api/comments?image_id=1"))
            .await
            .expect("comments"),
    )
    .await;
    let comments = body["comments"].as_array().expect("comments");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["author"], "Anonymous");
    assert_eq!(comments[0]["content"], "lovely shot");
}

#[tokio::test]
async fn comments_list_newest_first() {
    let app = build_app().await;
    seed_images(&app.repos, 1).await;

    for text in ["first", "second", "third"] {
        let response = app
            .router
            .clone()
            .oneshot(form_request(
                "/api/comment",
                &format!("image_id=1&author=ada&content={text}"),
            ))
            .await
            .expect("comment");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let body = json_body(
        app.router
            .clone()
            .oneshot(get_request("/api/comments?image_id=1"))
            .await
            .expect("comments"),
    )
    .await;
    let contents: Vec<&str> = body["comments"]
        .as_array()
        .expect("comments")
        .iter()
        .map(|comment| comment["content"].as_str().expect("content"))
        .collect();
    assert_eq!(contents, ["third", "second", "first"]);
}

#[tokio::test]
async fn unsupported_declared_types_are_rejected_before_any_side_effect() {
    let app = build_app().await;

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            &png_bytes(32, 32),
            "image/tiff",
            "scan.tiff",
            "",
        ))
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    assert_eq!(scalar(&app.repos, "SELECT COUNT(*) FROM images").await, 0);
    let stored = std::fs::read_dir(app.content_dir.path())
        .expect("read content dir")
        .count();
    assert_eq!(stored, 0, "no file may be written for a rejected upload");
}

#[tokio::test]
async fn oversized_uploads_are_rejected() {
    let app = build_app().await;

    let oversized = vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize];
    let response = app
        .router
        .clone()
        .oneshot(upload_request(&oversized, "image/jpeg", "huge.jpg", ""))
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(scalar(&app.repos, "SELECT COUNT(*) FROM images").await, 0);
}

#[tokio::test]
async fn corrupt_images_fail_after_the_file_is_stored() {
    let app = build_app().await;

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            b"this is not a png",
            "image/png",
            "fake.png",
            "",
        ))
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["success"], Value::Bool(false));

    // The write precedes decode validation and is not rolled back: the
    // orphaned file stays, the metadata row never appears.
    assert_eq!(scalar(&app.repos, "SELECT COUNT(*) FROM images").await, 0);
    let stored = std::fs::read_dir(app.content_dir.path())
        .expect("read content dir")
        .count();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn mutating_routes_reject_get() {
    let app = build_app().await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/vote"))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn stored_files_are_served_with_their_content_type() {
    let app = build_app().await;

    let upload = json_body(
        app.router
            .clone()
            .oneshot(upload_request(
                &png_bytes(16, 16),
                "image/png",
                "tiny.png",
                "",
            ))
            .await
            .expect("upload"),
    )
    .await;
    assert_eq!(upload["success"], Value::Bool(true));

    let listing = json_body(
        app.router
            .clone()
            .oneshot(get_request("/api/images?page=1"))
            .await
            .expect("list"),
    )
    .await;
    let filename = listing["images"][0]["filename"]
        .as_str()
        .expect("filename")
        .to_string();

    let response = app
        .router
        .clone()
        .oneshot(get_request(&format!("/content/{filename}")))
        .await
        .expect("serve");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .expect("content type"),
        "image/png"
    );

    let response = app
        .router
        .clone()
        .oneshot(get_request("/content/missing.png"))
        .await
        .expect("serve missing");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoint_answers_no_content() {
    let app = build_app().await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/healthz"))
        .await
        .expect("health");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
