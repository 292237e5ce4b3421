use super::Busy;
use crate::api::BookApi;
use crate::error::{ClientError, Result};
use crate::model::{Book, BookForm, BookPage, BookPatch, BookQuery};
use crate::notify::Notifier;
use parking_lot::RwLock;
use std::sync::Arc;

/// Local view of the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookListState {
    /// Books from the last list or search, plus local edits since.
    pub books: Vec<Book>,
    /// Book loaded by the last detail lookup.
    pub current: Option<Book>,
    /// Total reported with the last list or search.
    pub total: u64,
}

/// Book collection store.
///
/// Every operation raises the busy flag, calls the API, reconciles the local
/// list with the result, and on failure notifies the user before returning
/// the error. Local state only changes after the server succeeded.
///
/// Overlapping list or search calls are not cancelled: whichever response
/// arrives last replaces the list.
pub struct BookStore {
    api: BookApi,
    notifier: Arc<dyn Notifier>,
    state: RwLock<BookListState>,
    loading: Busy,
}

impl BookStore {
    /// Create an empty store.
    pub fn new(api: BookApi, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: RwLock::new(BookListState::default()),
            loading: Busy::default(),
        }
    }

    /// Whether a call is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    /// Copy of the local state.
    pub fn snapshot(&self) -> BookListState {
        self.state.read().clone()
    }

    /// Books currently held.
    pub fn books(&self) -> Vec<Book> {
        self.state.read().books.clone()
    }

    /// Total from the last list or search.
    pub fn total(&self) -> u64 {
        self.state.read().total
    }

    /// Book from the last detail lookup.
    pub fn current(&self) -> Option<Book> {
        self.state.read().current.clone()
    }

    /// Forget the current book.
    pub fn reset_current(&self) {
        self.state.write().current = None;
    }

    /// Load a page of books, replacing the local list.
    pub async fn list(&self, query: &BookQuery) -> Result<BookPage> {
        let _busy = self.loading.enter();
        let page = self
            .api
            .list(query)
            .await
            .inspect_err(|e| self.report(e, "Failed to load books, please retry"))?;
        self.replace_list(&page);
        Ok(page)
    }

    /// Search books, replacing the local list.
    pub async fn search(&self, query: &BookQuery) -> Result<BookPage> {
        let _busy = self.loading.enter();
        let page = self
            .api
            .search(query)
            .await
            .inspect_err(|e| self.report(e, "Failed to search books, please retry"))?;
        self.replace_list(&page);
        Ok(page)
    }

    /// Search by title, replacing the local list.
    pub async fn search_by_title(&self, title: &str) -> Result<BookPage> {
        let _busy = self.loading.enter();
        let page = self
            .api
            .search_by_title(title)
            .await
            .inspect_err(|e| self.report(e, "Failed to search books, please retry"))?;
        self.replace_list(&page);
        Ok(page)
    }

    /// Search by author, replacing the local list.
    pub async fn search_by_author(&self, author: &str) -> Result<BookPage> {
        let _busy = self.loading.enter();
        let page = self
            .api
            .search_by_author(author)
            .await
            .inspect_err(|e| self.report(e, "Failed to search books, please retry"))?;
        self.replace_list(&page);
        Ok(page)
    }

    /// Search by publisher, replacing the local list.
    pub async fn search_by_publisher(&self, publisher: &str) -> Result<BookPage> {
        let _busy = self.loading.enter();
        let page = self
            .api
            .search_by_publisher(publisher)
            .await
            .inspect_err(|e| self.report(e, "Failed to search books, please retry"))?;
        self.replace_list(&page);
        Ok(page)
    }

    /// Load one book into `current`.
    pub async fn get_by_id(&self, id: i64) -> Result<Book> {
        let _busy = self.loading.enter();
        let book = self
            .api
            .get(id)
            .await
            .inspect_err(|e| self.report(e, "Failed to load book details, please retry"))?;
        self.state.write().current = Some(book.clone());
        Ok(book)
    }

    /// Load one book by ISBN into `current`.
    pub async fn get_by_isbn(&self, isbn: &str) -> Result<Book> {
        let _busy = self.loading.enter();
        let book = self
            .api
            .get_by_isbn(isbn)
            .await
            .inspect_err(|e| self.report(e, "Failed to load book details, please retry"))?;
        self.state.write().current = Some(book.clone());
        Ok(book)
    }

    /// Create a book and put it at the top of the local list.
    pub async fn create(&self, form: &BookForm) -> Result<Book> {
        let _busy = self.loading.enter();
        let book = self
            .api
            .create(form)
            .await
            .inspect_err(|e| self.report_server(e, "Failed to create book, please retry"))?;

        self.state.write().books.insert(0, book.clone());
        tracing::info!(id = book.id, title = %book.title, "Book created");
        self.notifier.success("Book created");
        Ok(book)
    }

    /// Update a book and merge the result into the local copy, if held.
    pub async fn update(&self, id: i64, patch: &BookPatch) -> Result<Book> {
        let _busy = self.loading.enter();
        let reply = self
            .api
            .update(id, patch)
            .await
            .inspect_err(|e| self.report_server(e, "Failed to update book, please retry"))?;

        {
            let mut state = self.state.write();
            match state.books.iter_mut().find(|b| b.id == id) {
                Some(local) => local.merge(&reply),
                // Not refetched: the list keeps whatever it had.
                None => tracing::debug!(id, "Updated book is not in the local list"),
            }
        }

        tracing::info!(id, "Book updated");
        self.notifier.success("Book updated");
        Ok(reply.book)
    }

    /// Delete a book and drop it from the local list.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let _busy = self.loading.enter();
        self.api
            .delete(id)
            .await
            .inspect_err(|e| self.report_server(e, "Failed to delete book, please retry"))?;

        self.state.write().books.retain(|b| b.id != id);
        tracing::info!(id, "Book deleted");
        self.notifier.success("Book deleted");
        Ok(())
    }

    /// Total number of books on the server. Leaves local state alone.
    pub async fn count(&self) -> Result<u64> {
        let _busy = self.loading.enter();
        self.api
            .count()
            .await
            .inspect_err(|e| self.report(e, "Failed to count books, please retry"))
    }

    fn replace_list(&self, page: &BookPage) {
        let mut state = self.state.write();
        state.books = page.items.clone();
        state.total = page.total_count;
        tracing::debug!(
            items = state.books.len(),
            total = state.total,
            page = page.page_index,
            "Book list replaced"
        );
    }

    fn report(&self, error: &ClientError, message: &str) {
        tracing::error!(error = %error, "{}", message);
        self.notifier.error(message);
    }

    fn report_server(&self, error: &ClientError, fallback: &str) {
        self.report(error, error.server_message().unwrap_or(fallback));
    }
}
