use std::ops::Range;

pub const ROWS_PER_PAGE_OPTIONS: [usize; 4] = [5, 10, 25, 50];
pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

/// Page state over the derived view. Pages are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    rows_per_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS_PER_PAGE)
    }
}

impl Pagination {
    /// Unknown page sizes fall back to the default.
    pub fn new(rows_per_page: usize) -> Self {
        let rows_per_page = if ROWS_PER_PAGE_OPTIONS.contains(&rows_per_page) {
            rows_per_page
        } else {
            DEFAULT_ROWS_PER_PAGE
        };
        Self {
            page: 0,
            rows_per_page,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.rows_per_page).max(1)
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Changing the page size starts over at the first page. Returns false for sizes that
    /// are not offered.
    pub fn set_rows_per_page(&mut self, rows_per_page: usize) -> bool {
        if !ROWS_PER_PAGE_OPTIONS.contains(&rows_per_page) {
            return false;
        }
        self.rows_per_page = rows_per_page;
        self.page = 0;
        true
    }

    /// Steps through the page size options. `step` is -1 or 1.
    pub fn cycle_rows_per_page(&mut self, step: i32) {
        let current = ROWS_PER_PAGE_OPTIONS
            .iter()
            .position(|&n| n == self.rows_per_page)
            .unwrap_or(0);
        let next = match step {
            s if s < 0 => current.saturating_sub(1),
            _ => (current + 1).min(ROWS_PER_PAGE_OPTIONS.len() - 1),
        };
        self.set_rows_per_page(ROWS_PER_PAGE_OPTIONS[next]);
    }

    pub fn next_page(&mut self, total: usize) {
        if self.page + 1 < self.page_count(total) {
            self.page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    /// Pulls the page back inside the view after it shrank.
    pub fn clamp(&mut self, total: usize) {
        self.page = self.page.min(self.page_count(total) - 1);
    }

    /// Slice bounds of the current page within a view of `total` rows.
    pub fn range(&self, total: usize) -> Range<usize> {
        let begin = std::cmp::min(self.page * self.rows_per_page, total);
        let end = std::cmp::min(begin + self.rows_per_page, total);
        begin..end
    }
}
