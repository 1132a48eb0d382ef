//! Pagination over an in-memory result set
//!
//! Listing pages fetch the full ordered result set and slice it here. A page
//! number outside the set yields an empty page, never an error.

use serde::Serialize;

/// Navigation metadata rendered below a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageNav {
    /// Requested page number (1-indexed, may be out of range)
    pub page: i64,
    pub prev_num: i64,
    pub next_num: i64,
    /// False only for page 1 (and anything before it)
    pub has_prev: bool,
    /// False once the slice reaches the end of the set
    pub has_next: bool,
}

/// One page of results borrowed from the full set
#[derive(Debug)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub nav: PageNav,
}

/// Slice `results` for a 1-indexed `page` of `per_page` items
///
/// # Examples
/// ```
/// use uhcsdb_catalog::pagination::paginate;
///
/// let entries: Vec<u32> = (0..100).collect();
///
/// let first = paginate(&entries, 1, 24);
/// assert_eq!(first.items.len(), 24);
/// assert!(!first.nav.has_prev);
/// assert!(first.nav.has_next);
///
/// let last = paginate(&entries, 5, 24);
/// assert_eq!(last.items, &entries[96..]);
/// assert!(!last.nav.has_next);
///
/// assert!(paginate(&entries, 6, 24).items.is_empty());
/// ```
pub fn paginate<T>(results: &[T], page: i64, per_page: usize) -> Page<'_, T> {
    let len = results.len();
    let per_page = per_page.max(1);

    let start = page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(per_page as i64))
        .filter(|start| *start >= 0)
        .and_then(|start| usize::try_from(start).ok())
        .filter(|start| *start < len);

    let items = match start {
        Some(start) => {
            let end = start.saturating_add(per_page).min(len);
            &results[start..end]
        }
        None => &results[0..0],
    };

    let reaches_end = match start {
        Some(start) => start + items.len() >= len,
        None => true,
    };

    Page {
        items,
        nav: PageNav {
            page,
            prev_num: page.saturating_sub(1),
            next_num: page.saturating_add(1),
            has_prev: page.saturating_sub(1) > 0,
            has_next: !reaches_end,
        },
    }
}

/// Number of pages needed for `len` items
pub fn page_count(len: usize, per_page: usize) -> usize {
    let per_page = per_page.max(1);
    (len + per_page - 1) / per_page
}
