//! reqwest-backed gateway

use super::{LibraryGateway, Operation};
use crate::config::BackendConfig;
use crate::errors::{AppError, Result};
use crate::metrics::RequestMetrics;
use crate::models::{attachment_file_name, Attachment, Author, AuthorId, Book, BookId, PDF_CONTENT_TYPE};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// HTTP client for the books/authors REST backend
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    books_url: String,
    authors_url: String,
}

impl HttpGateway {
    /// Create a gateway for the configured backend
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self::with_client(client, config))
    }

    /// Create a gateway sharing an existing client
    pub fn with_client(client: Client, config: &BackendConfig) -> Self {
        Self {
            client,
            books_url: config.books_url(),
            authors_url: config.authors_url(),
        }
    }

    fn book_url(&self, id: BookId) -> String {
        format!("{}/{}", self.books_url, id)
    }

    fn author_url(&self, id: AuthorId) -> String {
        format!("{}/{}", self.authors_url, id)
    }

    /// Issue one request; non-2xx answers and transport failures become errors
    async fn send(&self, operation: Operation, request: RequestBuilder) -> Result<Response> {
        let metrics = RequestMetrics::start(operation);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics.finish_unreachable();
                warn!(operation = %operation, error = %e, "Backend unreachable");
                return Err(AppError::Connection {
                    operation,
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        metrics.finish(status.as_u16());

        if !status.is_success() {
            warn!(operation = %operation, status = status.as_u16(), "Backend rejected request");
            return Err(AppError::Remote {
                operation,
                status: status.as_u16(),
            });
        }

        debug!(operation = %operation, status = status.as_u16(), "Backend request completed");
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(operation: Operation, response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| AppError::Decode {
            operation,
            message: e.to_string(),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(operation, request).await?;
        Self::decode(operation, response).await
    }
}

#[async_trait]
impl LibraryGateway for HttpGateway {
    async fn list_books(&self) -> Result<Vec<Book>> {
        self.send_json(Operation::ListBooks, self.client.get(&self.books_url))
            .await
    }

    async fn get_book(&self, id: BookId) -> Result<Book> {
        self.send_json(Operation::GetBook, self.client.get(self.book_url(id)))
            .await
    }

    async fn create_book(&self, book: &Book) -> Result<Book> {
        self.send_json(
            Operation::CreateBook,
            self.client.post(&self.books_url).json(book),
        )
        .await
    }

    async fn update_book(&self, id: BookId, book: &Book) -> Result<Book> {
        self.send_json(
            Operation::UpdateBook,
            self.client.put(self.book_url(id)).json(book),
        )
        .await
    }

    async fn delete_book(&self, id: BookId) -> Result<()> {
        self.send(Operation::DeleteBook, self.client.delete(self.book_url(id)))
            .await?;
        Ok(())
    }

    async fn upload_attachment(&self, id: BookId, attachment: &Attachment) -> Result<Option<Book>> {
        let operation = Operation::UploadAttachment;

        let part = Part::bytes(attachment.bytes.clone())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.content_type)
            .map_err(|_| AppError::InvalidAttachment {
                content_type: attachment.content_type.clone(),
            })?;
        let form = Form::new().part("file", part);

        let url = format!("{}/upload-pdf", self.book_url(id));
        let response = self.send(operation, self.client.post(url).multipart(form)).await?;

        // The backend may answer with the updated book or a plain-text receipt.
        let body = response.bytes().await.map_err(|e| AppError::Decode {
            operation,
            message: e.to_string(),
        })?;
        Ok(serde_json::from_slice::<Book>(&body).ok())
    }

    async fn fetch_attachment(&self, file_name: &str) -> Result<Attachment> {
        let operation = Operation::FetchAttachment;
        let url = format!("{}/files/{}", self.books_url, file_name);
        let response = self.send(operation, self.client.get(url)).await?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(PDF_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await.map_err(|e| AppError::Decode {
            operation,
            message: e.to_string(),
        })?;

        Ok(Attachment::new(file_name, content_type, bytes.to_vec()))
    }

    async fn list_authors(&self) -> Result<Vec<Author>> {
        self.send_json(Operation::ListAuthors, self.client.get(&self.authors_url))
            .await
    }

    async fn get_author(&self, id: AuthorId) -> Result<Author> {
        self.send_json(Operation::GetAuthor, self.client.get(self.author_url(id)))
            .await
    }

    async fn create_author(&self, author: &Author) -> Result<Author> {
        self.send_json(
            Operation::CreateAuthor,
            self.client.post(&self.authors_url).json(author),
        )
        .await
    }

    async fn update_author(&self, id: AuthorId, author: &Author) -> Result<Author> {
        self.send_json(
            Operation::UpdateAuthor,
            self.client.put(self.author_url(id)).json(author),
        )
        .await
    }

    async fn delete_author(&self, id: AuthorId) -> Result<()> {
        self.send(Operation::DeleteAuthor, self.client.delete(self.author_url(id)))
            .await?;
        Ok(())
    }

    fn attachment_url(&self, pdf_path: &str) -> String {
        format!("{}/files/{}", self.books_url, attachment_file_name(pdf_path))
    }
}
