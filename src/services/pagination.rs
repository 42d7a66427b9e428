//! Pagination window calculation.
//!
//! Shows up to ten page numbers that follow the current page:
//! - pages 1..=6 pin the window to the start
//! - near the end of a long result set the window pins to the last ten pages
//! - otherwise the window starts five pages before the current one

use crate::models::PaginationState;
use crate::{Error, Result};

/// Computes total pages and the page-number window.
///
/// `page` is coerced to at least 1. An empty result set yields
/// `window_start = 1, window_end = 0`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `per_page` is zero.
pub fn compute_pagination(total: u64, per_page: u32, page: u32) -> Result<PaginationState> {
    if per_page == 0 {
        return Err(Error::InvalidInput(
            "per_page must be positive to compute pagination".to_string(),
        ));
    }

    let total_pages = total.div_ceil(u64::from(per_page));
    let page = u64::from(page.max(1));

    // signed: total_pages - 9 goes negative for short result sets
    let pages = i128::from(total_pages);
    let current = i128::from(page);

    let window_start = if current <= 6 {
        1
    } else if current > pages - 9 && pages - 9 > 10 {
        pages - 9
    } else {
        current - 5
    };

    let window_end = if pages < 10 || current + 4 > pages {
        pages
    } else {
        window_start + 9
    };

    Ok(PaginationState {
        total_pages,
        current_page: page,
        window_start: u64::try_from(window_start).unwrap_or(1),
        window_end: u64::try_from(window_end).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(195, 20, 1 => (10, 1, 10) ; "first page of ten")]
    #[test_case(195, 20, 8 => (10, 3, 10) ; "late page of ten")]
    #[test_case(0, 20, 1 => (0, 1, 0) ; "empty result set")]
    #[test_case(45, 20, 2 => (3, 1, 3) ; "short result set")]
    #[test_case(1000, 20, 6 => (50, 1, 10) ; "page six pins to start")]
    #[test_case(1000, 20, 7 => (50, 2, 11) ; "page seven slides")]
    #[test_case(1000, 20, 25 => (50, 20, 29) ; "middle of long set")]
    #[test_case(1000, 20, 45 => (50, 41, 50) ; "near end pins to last ten")]
    #[test_case(1000, 20, 50 => (50, 41, 50) ; "last page")]
    #[test_case(400, 20, 15 => (20, 11, 20) ; "tail of twenty pages pins")]
    #[test_case(380, 20, 15 => (19, 10, 19) ; "tail of nineteen pages slides")]
    #[test_case(380, 20, 12 => (19, 7, 16) ; "before tail")]
    fn test_window(total: u64, per_page: u32, page: u32) -> (u64, u64, u64) {
        let state = compute_pagination(total, per_page, page).unwrap();
        (state.total_pages, state.window_start, state.window_end)
    }

    #[test]
    fn test_zero_per_page_rejected() {
        let err = compute_pagination(10, 0, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_page_zero_coerced() {
        let state = compute_pagination(100, 20, 0).unwrap();
        assert_eq!(state.current_page, 1);
        assert_eq!(state.window_start, 1);
    }

    #[test]
    fn test_empty_window_is_empty() {
        let state = compute_pagination(0, 20, 1).unwrap();
        assert!(state.is_empty());
    }
}
