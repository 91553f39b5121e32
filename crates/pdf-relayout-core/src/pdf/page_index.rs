//! Page index newtype for safe conversion between usize and i32.
//!
//! mupdf addresses pages with i32 and lopdf with 1-based u32; this wrapper
//! centralizes the conversions and the bounds check.

use std::fmt;

use crate::error::Error;

/// A validated page index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(i32);

impl PageIndex {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// The 1-indexed page number for lopdf's page APIs.
    #[must_use]
    pub const fn as_lopdf_page_number(self) -> u32 {
        (self.0 + 1).cast_unsigned()
    }

    /// Try to create a PageIndex from a usize page number.
    ///
    /// Returns an error if the page number exceeds the total page count or
    /// does not fit in an i32.
    pub fn try_from_page_num(page_num: usize, total_pages: usize) -> Result<Self, Error> {
        if page_num >= total_pages {
            return Err(Error::InvalidPage {
                page: page_num,
                total: total_pages,
            });
        }

        let index = i32::try_from(page_num).map_err(|_| Error::InvalidPage {
            page: page_num,
            total: total_pages,
        })?;

        Ok(Self(index))
    }
}

impl From<PageIndex> for i32 {
    fn from(index: PageIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
