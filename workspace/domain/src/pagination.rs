use crate::{DomainError, Result};

pub const ALLOWED_PAGE_SIZES: [u64; 5] = [10, 30, 50, 70, 100];
pub const DEFAULT_PAGE_SIZE: u64 = 30;

/// Requested page, normalised from raw query-string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// A missing or unparsable `page` becomes 1 and anything below 1 is raised to 1.
    /// A missing or unparsable `page_size` becomes the default; a parsed size outside
    /// [`ALLOWED_PAGE_SIZES`] is an error.
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Result<Self> {
        let page = page
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|page| *page >= 1)
            .map(|page| page as u64)
            .unwrap_or(1);

        let page_size = page_size
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE as i64);

        let page_size = u64::try_from(page_size)
            .ok()
            .filter(|size| ALLOWED_PAGE_SIZES.contains(size))
            .ok_or_else(|| {
                DomainError::Rejected(format!(
                    "Invalid page_size. Allowed values are: {}",
                    ALLOWED_PAGE_SIZES
                        .iter()
                        .map(u64::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;

        Ok(Self { page, page_size })
    }
}

/// The page actually served once the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageWindow {
    /// Clamps the requested page into `1..=total_pages`; an empty set still has one page.
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(request.page_size).max(1);
        let page = request.page.clamp(1, total_pages);

        Self {
            page,
            page_size: request.page_size,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}
