//! Page selection for listing queries.

use crate::error::ValidationError;

/// A requested page of results, or the unpaged sentinel.
///
/// Sized specs always hold `size >= 1`; invalid values are rejected by the
/// constructors and never reach a storage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PageSpec {
    window: Option<Window>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Window {
    size: u64,
    index: u64,
}

impl PageSpec {
    /// No limit: every matching row.
    pub const fn unpaged() -> Self {
        Self { window: None }
    }

    /// First page (index 0) of the given size.
    pub fn of_size(size: i64) -> Result<Self, ValidationError> {
        if size < 1 {
            return Err(ValidationError::PageSize { size });
        }
        Ok(Self {
            window: Some(Window {
                size: size as u64,
                index: 0,
            }),
        })
    }

    /// Same size, different page. Fails on the unpaged sentinel.
    pub fn with_page(&self, index: i64) -> Result<Self, ValidationError> {
        let Some(window) = self.window else {
            return Err(ValidationError::Unpaged { index });
        };
        if index < 0 {
            return Err(ValidationError::PageIndex { index });
        }
        let index = index as u64;
        if window.size.checked_mul(index).is_none() {
            return Err(ValidationError::PageOutOfRange {
                size: window.size,
                index,
            });
        }
        Ok(Self {
            window: Some(Window {
                size: window.size,
                index,
            }),
        })
    }

    pub fn is_paged(&self) -> bool {
        self.window.is_some()
    }

    /// Rows per page, `None` when unpaged.
    pub fn size(&self) -> Option<u64> {
        self.window.map(|w| w.size)
    }

    /// Zero-based page index, `None` when unpaged.
    pub fn index(&self) -> Option<u64> {
        self.window.map(|w| w.index)
    }

    /// Number of rows to skip before this page.
    pub fn offset(&self) -> u64 {
        // Overflow is rejected in `with_page`.
        self.window.map_or(0, |w| w.size * w.index)
    }

    /// Row window `(offset, limit)` for slicing an in-memory sequence.
    pub fn bounds(&self) -> Option<(u64, u64)> {
        self.window.map(|w| (w.size * w.index, w.size))
    }
}

impl std::fmt::Display for PageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.window {
            Some(w) => write!(f, "page {} (size {})", w.index, w.size),
            None => f.write_str("unpaged"),
        }
    }
}
