use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_pages: usize,
    pub total_count: usize,
    pub current_page: usize,
}

/// Number of pages needed for `count` items; never less than one so an
/// empty result still renders as "page 1 of 1".
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Slices out 1-indexed `page` of `items`.
///
/// Page 0 is read as page 1 and a zero page size as one. A page past the
/// end yields an empty slice rather than an error.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let total_count = items.len();

    let start = (page - 1).saturating_mul(page_size).min(total_count);
    let end = start.saturating_add(page_size).min(total_count);

    Page {
        items: &items[start..end],
        total_pages: total_pages(total_count, page_size),
        total_count,
        current_page: page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_collection_is_one_page() {
        let empty: Vec<u32> = Vec::new();
        let page = paginate(&empty, 5, 1);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn test_seven_items_five_per_page() {
        let items: Vec<u32> = (1..=7).collect();
        let first = paginate(&items, 5, 1);
        assert_eq!(first.items, &[1, 2, 3, 4, 5]);
        assert_eq!(first.total_pages, 2);
        let second = paginate(&items, 5, 2);
        assert_eq!(second.items, &[6, 7]);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let items: Vec<u32> = (1..=7).collect();
        let page = paginate(&items, 5, 999);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 999);
    }

    #[test]
    fn test_degenerate_inputs_are_clamped() {
        let items: Vec<u32> = (1..=3).collect();
        assert_eq!(paginate(&items, 0, 0).items, &[1]);
        assert!(paginate(&items, usize::MAX, usize::MAX).items.is_empty());
    }

    proptest! {
        #[test]
        fn test_pages_cover_every_item_once(len in 0usize..60, page_size in 1usize..12) {
            let items: Vec<usize> = (0..len).collect();
            let pages = total_pages(len, page_size);
            let mut seen = Vec::new();
            for page in 1..=pages {
                seen.extend_from_slice(paginate(&items, page_size, page).items);
            }
            prop_assert_eq!(seen, items);
        }
    }
}
