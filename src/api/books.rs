use crate::error::{ClientError, Result};
use crate::http::{ApiRequest, HttpClient};
use crate::model::{Book, BookForm, BookPage, BookPatch, BookQuery, BookReply};
use std::sync::Arc;

/// Client for the `/books` endpoints.
#[derive(Clone)]
pub struct BookApi {
    http: Arc<HttpClient>,
}

impl BookApi {
    /// Create a client sharing `http`.
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// `GET /books`
    pub async fn list(&self, query: &BookQuery) -> Result<BookPage> {
        let request = ApiRequest::get("/books").query(query.to_pairs());
        self.http.send_json(request).await
    }

    /// `GET /books/{id}`
    pub async fn get(&self, id: i64) -> Result<Book> {
        self.http
            .send_json(ApiRequest::get(format!("/books/{}", id)))
            .await
    }

    /// `GET /books/isbn/{isbn}`
    pub async fn get_by_isbn(&self, isbn: &str) -> Result<Book> {
        if isbn.trim().is_empty() {
            return Err(ClientError::InvalidRequest("ISBN must not be empty".to_string()));
        }
        let path = format!("/books/isbn/{}", urlencoding::encode(isbn));
        self.http.send_json(ApiRequest::get(path)).await
    }

    /// `POST /books`
    pub async fn create(&self, form: &BookForm) -> Result<Book> {
        let request = ApiRequest::post("/books").json(form)?;
        self.http.send_json(request).await
    }

    /// `PUT /books/{id}`
    pub async fn update(&self, id: i64, patch: &BookPatch) -> Result<BookReply> {
        let request = ApiRequest::put(format!("/books/{}", id)).json(patch)?;
        self.http.send_json(request).await
    }

    /// `DELETE /books/{id}`
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.http
            .send_empty(ApiRequest::delete(format!("/books/{}", id)))
            .await
    }

    /// `GET /books/search`
    pub async fn search(&self, query: &BookQuery) -> Result<BookPage> {
        let request = ApiRequest::get("/books/search").query(query.to_pairs());
        self.http.send_json(request).await
    }

    /// `GET /books/search/title`
    pub async fn search_by_title(&self, title: &str) -> Result<BookPage> {
        self.search_by("title", title).await
    }

    /// `GET /books/search/author`
    pub async fn search_by_author(&self, author: &str) -> Result<BookPage> {
        self.search_by("author", author).await
    }

    /// `GET /books/search/publisher`
    pub async fn search_by_publisher(&self, publisher: &str) -> Result<BookPage> {
        self.search_by("publisher", publisher).await
    }

    async fn search_by(&self, field: &'static str, value: &str) -> Result<BookPage> {
        let request =
            ApiRequest::get(format!("/books/search/{}", field)).query([(field, value)]);
        self.http.send_json(request).await
    }

    /// `GET /books/count`
    pub async fn count(&self) -> Result<u64> {
        self.http.send_json(ApiRequest::get("/books/count")).await
    }
}
