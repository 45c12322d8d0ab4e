use serde::Serialize;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// Half-open row window `[(page-1)*per_page, page*per_page)`; pages below 1 read as 1.
pub fn bounds(page: usize, per_page: usize) -> (usize, usize) {
    let page = page.max(1);
    let start = (page - 1).saturating_mul(per_page);
    (start, start.saturating_add(per_page))
}

pub fn total_pages(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Slice an in-memory list.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Paginated<T> {
    let (start, end) = bounds(page, per_page);
    let slice = if start >= items.len() {
        Vec::new()
    } else {
        items[start..end.min(items.len())].to_vec()
    };
    Paginated::from_window(slice, page, per_page, items.len())
}

impl<T> Paginated<T> {
    /// Wrap a window that was already cut remotely.
    pub fn from_window(items: Vec<T>, page: usize, per_page: usize, total: usize) -> Self {
        Paginated {
            items,
            current_page: page.max(1),
            total_pages: total_pages(total, per_page),
            total,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}
