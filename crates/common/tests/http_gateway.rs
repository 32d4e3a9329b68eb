//! HttpGateway against an in-process fake of the REST backend.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use biblioteca_common::config::BackendConfig;
use biblioteca_common::{AppError, Attachment, Book, HttpGateway, LibraryGateway, Operation};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Received {
    bodies: Vec<Value>,
    uploads: Vec<(String, String, Vec<u8>)>,
}

type Shared = Arc<Mutex<Received>>;

fn dune_json(id: i64) -> Value {
    json!({
        "id": id,
        "titulo": "Dune",
        "autor": "Frank Herbert",
        "authors": [{ "id": 4, "name": "Frank Herbert" }],
        "paginas": 412,
        "disponivel": true,
        "dataPublicacao": "1965-08-01",
        "pdfPath": "uploads/dune.pdf"
    })
}

async fn list_books() -> Json<Value> {
    Json(json!([dune_json(1)]))
}

async fn create_book(State(received): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    received.lock().unwrap().bodies.push(body.clone());
    let mut created = body;
    created["id"] = json!(10);
    (StatusCode::CREATED, Json(created))
}

async fn get_book(Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
    if id == 1 {
        Ok(Json(dune_json(1)))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn update_book(Path(_id): Path<i64>) -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn delete_book(Path(_id): Path<i64>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn upload_pdf(
    State(received): State<Shared>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap().to_vec();
        received.lock().unwrap().uploads.push((name, file_name, bytes));
    }
    (StatusCode::OK, format!("Upload complete for book {}", id))
}

async fn get_file(Path(file_name): Path<String>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file_name),
            ),
        ],
        b"%PDF-1.4 fake".to_vec(),
    )
}

async fn list_authors() -> &'static str {
    "<html>not json</html>"
}

async fn spawn_backend() -> (HttpGateway, Shared) {
    let received = Shared::default();
    let app = Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/books/{id}/upload-pdf", post(upload_pdf))
        .route("/books/files/{filename}", get(get_file))
        .route("/authors", get(list_authors))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = BackendConfig {
        base_url: format!("http://{}", addr),
        ..BackendConfig::default()
    };
    (HttpGateway::new(&config).unwrap(), received)
}

fn new_book() -> Book {
    Book {
        id: None,
        title: "Dune".to_string(),
        author_ids: vec![4],
        page_count: 412,
        available: true,
        publication_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
        pdf_path: None,
    }
}

#[tokio::test]
async fn test_list_books_folds_embedded_authors() {
    let (gateway, _) = spawn_backend().await;

    let books = gateway.list_books().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].author_ids, vec![4]);
    assert_eq!(books[0].pdf_path.as_deref(), Some("uploads/dune.pdf"));
}

#[tokio::test]
async fn test_create_book_sends_author_ids() {
    let (gateway, received) = spawn_backend().await;

    let created = gateway.create_book(&new_book()).await.unwrap();
    assert_eq!(created.id, Some(10));

    let received = received.lock().unwrap();
    let bodies = &received.bodies;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["authorIds"], json!([4]));
    assert_eq!(bodies[0]["titulo"], json!("Dune"));
    assert!(bodies[0].get("id").is_none());
}

#[tokio::test]
async fn test_missing_book_is_remote_404() {
    let (gateway, _) = spawn_backend().await;

    let err = gateway.get_book(99).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Remote {
            operation: Operation::GetBook,
            status: 404
        }
    ));
}

#[tokio::test]
async fn test_server_failure_on_update() {
    let (gateway, _) = spawn_backend().await;

    let err = gateway.update_book(1, &new_book()).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.is_server_error());
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let (gateway, _) = spawn_backend().await;
    tokio_test::assert_ok!(gateway.delete_book(1).await);
}

#[tokio::test]
async fn test_upload_sends_multipart_file_field() {
    let (gateway, received) = spawn_backend().await;

    let receipt = gateway
        .upload_attachment(1, &Attachment::pdf("dune.pdf", b"%PDF-1.4".to_vec()))
        .await
        .unwrap();
    // Plain-text acknowledgement, no book in the body.
    assert!(receipt.is_none());

    let received = received.lock().unwrap();
    let uploads = &received.uploads;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "file");
    assert_eq!(uploads[0].1, "dune.pdf");
    assert_eq!(uploads[0].2, b"%PDF-1.4");
}

#[tokio::test]
async fn test_fetch_attachment_reads_bytes() {
    let (gateway, _) = spawn_backend().await;

    let file = gateway.fetch_attachment("dune.pdf").await.unwrap();
    assert_eq!(file.file_name, "dune.pdf");
    assert!(file.is_pdf());
    assert_eq!(file.bytes, b"%PDF-1.4 fake");
}

#[tokio::test]
async fn test_unreadable_body_is_decode_error() {
    let (gateway, _) = spawn_backend().await;

    let err = gateway.list_authors().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Decode {
            operation: Operation::ListAuthors,
            ..
        }
    ));
}
