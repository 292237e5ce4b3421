//! Book catalog payloads.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Circulation status of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookStatus {
    /// Can be borrowed.
    Available,
    /// All copies are out.
    Unavailable,
    /// Withdrawn for repair.
    Maintenance,
}

/// A book as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier for the book.
    pub id: i64,

    /// ISBN, unique across the catalog.
    pub isbn: String,

    /// Book title.
    pub title: String,

    /// Author name.
    pub author: String,

    /// Publisher name.
    pub publisher: String,

    /// Year of publication.
    pub publish_year: i32,

    /// Cover price.
    pub price: f64,

    /// Subject category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Language of the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Shelf location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,

    /// Blurb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Copies owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quantity: Option<u32>,

    /// Copies on the shelf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<u32>,

    /// Circulation status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookStatus>,

    /// Creation time, server local.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,

    /// Last modification time, server local.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Book {
    /// Shallow-merge a server reply into `self`.
    ///
    /// Every field present in the reply replaces the local value, including
    /// fields sent as `null`. Fields the reply leaves out keep their local
    /// value.
    pub fn merge(&mut self, reply: &BookReply) {
        let Ok(Value::Object(mut merged)) = serde_json::to_value(&*self) else {
            *self = reply.book.clone();
            return;
        };

        for (key, value) in &reply.fields {
            merged.insert(key.clone(), value.clone());
        }

        match serde_json::from_value(Value::Object(merged)) {
            Ok(book) => *self = book,
            Err(e) => {
                tracing::debug!(id = self.id, error = %e, "Merge failed, taking reply as is");
                *self = reply.book.clone();
            }
        }
    }

    /// Whether at least one copy can be borrowed.
    pub fn is_available(&self) -> bool {
        self.status != Some(BookStatus::Maintenance)
            && self.status != Some(BookStatus::Unavailable)
            && self.available_quantity.is_none_or(|n| n > 0)
    }
}

/// A book returned by the server together with the fields it actually sent.
///
/// `Book` alone cannot tell a field sent as `null` from one left out.
#[derive(Debug, Clone, PartialEq)]
pub struct BookReply {
    /// Decoded book.
    pub book: Book,
    /// Raw top-level fields of the reply.
    pub fields: Map<String, Value>,
}

impl<'de> Deserialize<'de> for BookReply {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        let book = serde_json::from_value(Value::Object(fields.clone()))
            .map_err(serde::de::Error::custom)?;
        Ok(Self { book, fields })
    }
}

/// Body for creating a book.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookForm {
    /// ISBN.
    pub isbn: String,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Publisher.
    pub publisher: String,
    /// Year of publication.
    pub publish_year: i32,
    /// Cover price.
    pub price: f64,
    /// Subject category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Language of the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Shelf location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Blurb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Copies owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quantity: Option<u32>,
}

/// Partial body for updating a book. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    /// ISBN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Publisher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Year of publication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_year: Option<i32>,
    /// Cover price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Subject category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Language of the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Shelf location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Blurb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Copies owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quantity: Option<u32>,
    /// Copies on the shelf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<u32>,
    /// Circulation status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookStatus>,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDir {
    fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

/// Filter, sort and pagination parameters for list and search calls.
///
/// Filters are combined with AND by the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    /// 0-based page index.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
    /// Field to sort by, in wire naming (`title`, `publishYear`, ...).
    pub sort_by: Option<String>,
    /// Sort direction.
    pub sort_dir: Option<SortDir>,
    /// Title contains.
    pub title: Option<String>,
    /// Author contains.
    pub author: Option<String>,
    /// Publisher contains.
    pub publisher: Option<String>,
    /// Exact ISBN.
    pub isbn: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Language.
    pub language: Option<String>,
}

impl BookQuery {
    /// Query matching titles containing `title`.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Query parameters in wire order. Unset and empty values are skipped.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        let numbers = [("page", self.page), ("size", self.size)];
        for (key, value) in numbers {
            if let Some(v) = value {
                pairs.push((key, v.to_string()));
            }
        }

        let strings = [
            ("sortBy", self.sort_by.as_deref()),
            ("sortDir", self.sort_dir.map(SortDir::as_str)),
            ("title", self.title.as_deref()),
            ("author", self.author.as_deref()),
            ("publisher", self.publisher.as_deref()),
            ("isbn", self.isbn.as_deref()),
            ("category", self.category.as_deref()),
            ("language", self.language.as_deref()),
        ];
        for (key, value) in strings {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        }

        pairs
    }
}

/// One server-side page of books.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "PageBody")]
pub struct BookPage {
    /// Books on this page.
    pub items: Vec<Book>,
    /// Number of books matching across all pages.
    pub total_count: u64,
    /// Number of pages.
    pub total_pages: u32,
    /// 0-based page index.
    pub page_index: u32,
    /// Requested page size.
    pub page_size: u32,
    /// First page.
    pub is_first: bool,
    /// Last page.
    pub is_last: bool,
}

/// Either a paged envelope or a bare array, depending on the endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody {
    Paged(PagedBody),
    Bare(Vec<Book>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PagedBody {
    content: Vec<Book>,
    #[serde(default)]
    total_elements: u64,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    size: u32,
    #[serde(default)]
    number: u32,
    #[serde(default = "default_true")]
    first: bool,
    #[serde(default = "default_true")]
    last: bool,
}

fn default_true() -> bool {
    true
}

impl From<PageBody> for BookPage {
    fn from(body: PageBody) -> Self {
        match body {
            PageBody::Paged(p) => {
                let total_count = if p.total_elements == 0 {
                    p.content.len() as u64
                } else {
                    p.total_elements
                };
                BookPage {
                    items: p.content,
                    total_count,
                    total_pages: p.total_pages,
                    page_index: p.number,
                    page_size: p.size,
                    is_first: p.first,
                    is_last: p.last,
                }
            }
            PageBody::Bare(items) => {
                let len = items.len();
                BookPage {
                    items,
                    total_count: len as u64,
                    total_pages: u32::from(len > 0),
                    page_index: 0,
                    page_size: len as u32,
                    is_first: true,
                    is_last: true,
                }
            }
        }
    }
}
