//! Page-number pagination shared by SKU and margin history listings.

/// Default number of records per page.
pub const PER_PAGE_DEFAULT: u32 = 20;

/// Upper bound on the page size.
pub const PER_PAGE_MAX: u32 = 1000;

/// 1-indexed page request. Fields are private; `new()` clamps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u32,
    size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            number: 1,
            size: PER_PAGE_DEFAULT,
        }
    }
}

impl PageRequest {
    /// Page numbers below 1 are clamped to 1; the size is kept within `1..=PER_PAGE_MAX`.
    pub fn new(number: i64, size: u32) -> Self {
        let number = number.clamp(1, i64::from(u32::MAX)) as u32;
        Self {
            number,
            size: size.clamp(1, PER_PAGE_MAX),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number.saturating_sub(1)) * u64::from(self.size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }

    /// Slice an already-ordered sequence down to this page.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(self.size as usize).collect()
    }
}
