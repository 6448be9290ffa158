use crate::domain::model::{Page, PageRequest};
use crate::utils::error::{Result, TriageError};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Largest `per_page` the REST API honours.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Races `call` against the token; a fired token drops the call.
pub async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TriageError::Cancelled),
        result = call => result,
    }
}

/// Fetches every page starting at page 1 and concatenates the items in server
/// order. The first failed fetch is returned and everything gathered so far is
/// dropped.
pub async fn collect_all<T, F, Fut>(
    page_size: u32,
    cancel: &CancellationToken,
    mut fetch: F,
) -> Result<Vec<T>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let per_page = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut items = Vec::new();
    let mut request = PageRequest { page: 1, per_page };

    loop {
        let page = cancellable(cancel, fetch(request)).await?;

        tracing::debug!(
            "Fetched page {} ({} items, next: {:?})",
            request.page,
            page.items.len(),
            page.next_page
        );
        items.extend(page.items);

        match page.next_page {
            Some(next) if next != 0 => request.page = next,
            _ => break,
        }
    }

    Ok(items)
}
