//! Lazy, finite sequence of listing pages.
//!
//! ```text
//! page 1 ─next=2─▶ page 2 ─next=3─▶ page 3 ─next=None─▶ end
//! ```
//!
//! A cursor that does not move forward ends the sequence, so a misbehaving
//! platform cannot make a listing loop. Restarting means building a new
//! [`Pages`] from page 1.

use crate::error::PortError;
use crate::ports::Page;

/// Iterator over pages fetched on demand by `fetch(page_number)`.
pub struct Pages<T, F>
where
    F: FnMut(u32) -> Result<Page<T>, PortError>,
{
    fetch: F,
    next: Option<u32>,
}

/// Pages of a listing, starting at page 1.
pub fn pages<T, F>(fetch: F) -> Pages<T, F>
where
    F: FnMut(u32) -> Result<Page<T>, PortError>,
{
    Pages {
        fetch,
        next: Some(1),
    }
}

impl<T, F> Iterator for Pages<T, F>
where
    F: FnMut(u32) -> Result<Page<T>, PortError>,
{
    type Item = Result<Vec<T>, PortError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        match (self.fetch)(current) {
            Ok(page) => {
                self.next = match page.next {
                    Some(n) if n > current => Some(n),
                    Some(n) => {
                        tracing::warn!("page cursor went from {current} to {n}; stopping listing");
                        None
                    }
                    None => None,
                };
                Some(Ok(page.items))
            }
            // Sequence ends after the first error.
            Err(err) => Some(Err(err)),
        }
    }
}

/// Drain every page into one vector, failing on the first error.
pub fn collect_all<T, F>(fetch: F) -> Result<Vec<T>, PortError>
where
    F: FnMut(u32) -> Result<Page<T>, PortError>,
{
    let mut all = Vec::new();
    for page in pages(fetch) {
        all.extend(page?);
    }
    Ok(all)
}
