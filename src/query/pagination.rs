//! Page slicing for list endpoints

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QuerySelect, Select};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// 1-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build from raw query parameters. Missing, non-numeric or zero values
    /// fall back to the defaults; sizes above the cap are clamped.
    pub fn from_raw(page: Option<&str>, size: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| {
            raw.and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
        };

        Self {
            page: parse(page).unwrap_or(DEFAULT_PAGE),
            size: parse(size).unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
        }
    }

    /// Row offset of this page, or `None` when it starts past `total_items`
    /// (including offsets too large to represent)
    pub fn offset_within(&self, total_items: u64) -> Option<u64> {
        self.page
            .saturating_sub(1)
            .checked_mul(self.size)
            .filter(|offset| *offset < total_items)
    }
}

/// `ceil(total_items / size)`
pub fn total_pages(total_items: u64, size: u64) -> u64 {
    if size == 0 {
        return 0;
    }
    total_items.div_ceil(size)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub page: u64,
    pub size: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            page: self.page,
            size: self.size,
        }
    }
}

/// Run `select` for one page: one COUNT plus one windowed fetch.
/// Pages past the end come back empty.
pub async fn paginate_select<E, C>(
    select: Select<E>,
    db: &C,
    request: PageRequest,
) -> Result<Page<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
    C: ConnectionTrait,
{
    let total_items = select.clone().count(db).await?;
    let items = match request.offset_within(total_items) {
        Some(offset) => select.offset(offset).limit(request.size).all(db).await?,
        None => Vec::new(),
    };

    Ok(Page {
        items,
        total_items,
        total_pages: total_pages(total_items, request.size),
        page: request.page,
        size: request.size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_or_garbage_input() {
        assert_eq!(PageRequest::from_raw(None, None), PageRequest::default());
        assert_eq!(
            PageRequest::from_raw(Some("abc"), Some("-3")),
            PageRequest { page: 1, size: 10 }
        );
        assert_eq!(
            PageRequest::from_raw(Some("0"), Some("0")),
            PageRequest { page: 1, size: 10 }
        );
        assert_eq!(
            PageRequest::from_raw(Some(" 3 "), Some("25")),
            PageRequest { page: 3, size: 25 }
        );
    }

    #[test]
    fn test_size_is_capped() {
        assert_eq!(PageRequest::from_raw(None, Some("5000")).size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(100, 7), 15);
        for n in 0..60u64 {
            for size in 1..12u64 {
                assert_eq!(total_pages(n, size), (n as f64 / size as f64).ceil() as u64);
            }
        }
    }

    #[test]
    fn test_offset_within_total() {
        let first = PageRequest { page: 1, size: 10 };
        assert_eq!(first.offset_within(15), Some(0));
        assert_eq!(first.offset_within(0), None);

        let second = PageRequest { page: 2, size: 10 };
        assert_eq!(second.offset_within(15), Some(10));
        assert_eq!(second.offset_within(10), None);
    }

    #[test]
    fn test_huge_page_has_no_offset() {
        let request = PageRequest::from_raw(Some("999999999999999999"), Some("100"));
        assert_eq!(request.page, 999_999_999_999_999_999);
        assert_eq!(request.offset_within(15), None);
        assert_eq!(
            PageRequest { page: u64::MAX, size: MAX_PAGE_SIZE }.offset_within(u64::MAX),
            None
        );
    }
}
