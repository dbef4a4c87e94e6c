//! The kept-page list: which original pages survive, and in what order.
//!
//! [`KeptPages`] is mutated by removal and drag-and-drop style moves. It
//! never becomes empty, never holds a page twice, and never holds a page
//! outside `1..=total`.

use crate::error::PdfEditError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Upper bound for page numbers and page-list length; pdfium indexes pages
/// with a `u16`.
pub const MAX_PAGES: u32 = u16::MAX as u32;

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s*-\s*(\d+)$").expect("static regex")
});

/// Where a dragged page lands relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropPosition {
    /// Insert in front of the target page. (default)
    #[default]
    Before,
    /// Insert right after the target page.
    After,
}

/// Ordered list of 1-based page numbers defining the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeptPages {
    order: Vec<u32>,
    total: u32,
}

impl KeptPages {
    /// Every page of a `total`-page document, in original order.
    pub fn all(total: u32) -> Result<Self, PdfEditError> {
        if total == 0 {
            return Err(PdfEditError::NoPagesSelected);
        }
        Ok(Self {
            order: (1..=total).collect(),
            total,
        })
    }

    /// A caller-chosen order, validated against a `total`-page document.
    pub fn from_order(order: Vec<u32>, total: u32) -> Result<Self, PdfEditError> {
        if order.is_empty() {
            return Err(PdfEditError::NoPagesSelected);
        }
        let mut seen = vec![false; total as usize + 1];
        for &page in &order {
            if page == 0 || page > total {
                return Err(PdfEditError::PageOutOfRange { page, total });
            }
            if std::mem::replace(&mut seen[page as usize], true) {
                return Err(PdfEditError::DuplicatePage { page });
            }
        }
        Ok(Self { order, total })
    }

    /// Page numbers in output order.
    pub fn as_slice(&self) -> &[u32] {
        &self.order
    }

    /// Page count of the source document.
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Never true for a list built through this type.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, page: u32) -> bool {
        self.order.contains(&page)
    }

    /// Source pages not in the list, ascending.
    pub fn removed(&self) -> Vec<u32> {
        (1..=self.total).filter(|p| !self.contains(*p)).collect()
    }

    /// Drop `page` from the list. Refused if it is the last remaining page.
    pub fn remove(&mut self, page: u32) -> Result<(), PdfEditError> {
        let idx = self
            .order
            .iter()
            .position(|&p| p == page)
            .ok_or(PdfEditError::PageNotKept { page })?;
        if self.order.len() <= 1 {
            return Err(PdfEditError::LastPage { page });
        }
        self.order.remove(idx);
        debug!("Removed page {} ({} pages kept)", page, self.order.len());
        Ok(())
    }

    /// Move `dragged` next to `target`.
    ///
    /// Dropping a page onto itself is a no-op. If `target` is not kept the
    /// page moves to the end.
    pub fn move_page(
        &mut self,
        dragged: u32,
        target: u32,
        position: DropPosition,
    ) -> Result<(), PdfEditError> {
        if dragged == target {
            return Ok(());
        }
        let from = self
            .order
            .iter()
            .position(|&p| p == dragged)
            .ok_or(PdfEditError::PageNotKept { page: dragged })?;
        self.order.remove(from);

        let insert_at = match self.order.iter().position(|&p| p == target) {
            Some(i) if position == DropPosition::After => i + 1,
            Some(i) => i,
            None => self.order.len(),
        };
        self.order.insert(insert_at, dragged);
        debug!("Moved page {} → position {}", dragged, insert_at + 1);
        Ok(())
    }

    /// Restore every page in original order.
    pub fn reset(&mut self) {
        self.order = (1..=self.total).collect();
    }
}

/// Parse a page list such as `3,1,2`, `1-4,7` or `5-1`.
///
/// Order is preserved; a descending range expands in descending order.
/// Pages are 1-indexed.
pub fn parse_page_list(input: &str) -> Result<Vec<u32>, PdfEditError> {
    let invalid = |reason: String| PdfEditError::InvalidPageList {
        input: input.to_string(),
        reason,
    };

    let mut pages = Vec::new();
    for token in input.split(',').map(str::trim) {
        if token.is_empty() {
            return Err(invalid("empty entry".into()));
        }
        if let Some(caps) = RANGE_RE.captures(token) {
            let start: u32 = caps[1]
                .parse()
                .map_err(|_| invalid(format!("'{token}' is not a page range")))?;
            let end: u32 = caps[2]
                .parse()
                .map_err(|_| invalid(format!("'{token}' is not a page range")))?;
            if start == 0 || end == 0 {
                return Err(invalid("pages are 1-indexed".into()));
            }
            if start.max(end) > MAX_PAGES {
                return Err(invalid(format!("pages above {MAX_PAGES} are not supported")));
            }
            if pages.len() + (start.abs_diff(end) as usize + 1) > MAX_PAGES as usize {
                return Err(invalid(format!("more than {MAX_PAGES} entries")));
            }
            if start <= end {
                pages.extend(start..=end);
            } else {
                pages.extend((end..=start).rev());
            }
        } else {
            let page: u32 = token
                .parse()
                .map_err(|_| invalid(format!("'{token}' is not a page number")))?;
            if page == 0 {
                return Err(invalid("pages are 1-indexed".into()));
            }
            if page > MAX_PAGES {
                return Err(invalid(format!("pages above {MAX_PAGES} are not supported")));
            }
            if pages.len() >= MAX_PAGES as usize {
                return Err(invalid(format!("more than {MAX_PAGES} entries")));
            }
            pages.push(page);
        }
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(v: &[u32]) -> Vec<u32> {
        let mut v = v.to_vec();
        v.sort_unstable();
        v
    }

    #[test]
    fn all_pages_in_order() {
        let k = KeptPages::all(4).unwrap();
        assert_eq!(k.as_slice(), &[1, 2, 3, 4]);
        assert!(k.removed().is_empty());
        assert!(KeptPages::all(0).is_err());
    }

    #[test]
    fn cannot_remove_last_page() {
        let mut k = KeptPages::all(2).unwrap();
        k.remove(1).unwrap();
        let err = k.remove(2).unwrap_err();
        assert!(matches!(err, PdfEditError::LastPage { page: 2 }));
        assert_eq!(k.len(), 1);
    }

    #[test]
    fn removing_unknown_page_fails() {
        let mut k = KeptPages::all(3).unwrap();
        k.remove(2).unwrap();
        assert!(matches!(k.remove(2), Err(PdfEditError::PageNotKept { page: 2 })));
        assert_eq!(k.removed(), vec![2]);
    }

    #[test]
    fn move_before_and_after_target() {
        let mut k = KeptPages::all(5).unwrap();
        k.move_page(5, 2, DropPosition::Before).unwrap();
        assert_eq!(k.as_slice(), &[1, 5, 2, 3, 4]);

        k.move_page(1, 3, DropPosition::After).unwrap();
        assert_eq!(k.as_slice(), &[5, 2, 3, 1, 4]);
    }

    #[test]
    fn move_to_removed_target_appends() {
        let mut k = KeptPages::all(4).unwrap();
        k.remove(4).unwrap();
        k.move_page(1, 4, DropPosition::Before).unwrap();
        assert_eq!(k.as_slice(), &[2, 3, 1]);
    }

    #[test]
    fn move_onto_itself_is_noop() {
        let mut k = KeptPages::all(3).unwrap();
        k.move_page(2, 2, DropPosition::After).unwrap();
        assert_eq!(k.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn moving_removed_page_fails() {
        let mut k = KeptPages::all(3).unwrap();
        k.remove(3).unwrap();
        assert!(k.move_page(3, 1, DropPosition::Before).is_err());
        assert_eq!(k.as_slice(), &[1, 2]);
    }

    #[test]
    fn moves_preserve_multiset() {
        let mut k = KeptPages::all(6).unwrap();
        k.remove(4).unwrap();
        let before = sorted(k.as_slice());
        let moves = [
            (1, 6, DropPosition::After),
            (6, 2, DropPosition::Before),
            (3, 1, DropPosition::After),
            (5, 5, DropPosition::Before),
            (2, 4, DropPosition::Before),
        ];
        for (dragged, target, pos) in moves {
            k.move_page(dragged, target, pos).unwrap();
            assert_eq!(sorted(k.as_slice()), before);
        }
    }

    #[test]
    fn removals_never_empty_the_list() {
        let mut k = KeptPages::all(3).unwrap();
        for p in [3, 1, 2, 2, 1] {
            let _ = k.remove(p);
            assert!(!k.is_empty());
        }
        assert_eq!(k.len(), 1);
    }

    #[test]
    fn reset_restores_all_pages() {
        let mut k = KeptPages::all(3).unwrap();
        k.remove(1).unwrap();
        k.move_page(3, 2, DropPosition::Before).unwrap();
        k.reset();
        assert_eq!(k.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn from_order_validates() {
        assert!(KeptPages::from_order(vec![3, 1], 3).is_ok());
        assert!(matches!(
            KeptPages::from_order(vec![], 3),
            Err(PdfEditError::NoPagesSelected)
        ));
        assert!(matches!(
            KeptPages::from_order(vec![1, 4], 3),
            Err(PdfEditError::PageOutOfRange { page: 4, total: 3 })
        ));
        assert!(matches!(
            KeptPages::from_order(vec![2, 2], 3),
            Err(PdfEditError::DuplicatePage { page: 2 })
        ));
    }

    #[test]
    fn parse_page_list_variants() {
        assert_eq!(parse_page_list("3,1,2").unwrap(), vec![3, 1, 2]);
        assert_eq!(parse_page_list("1-3, 7").unwrap(), vec![1, 2, 3, 7]);
        assert_eq!(parse_page_list("4-2").unwrap(), vec![4, 3, 2]);
        assert_eq!(parse_page_list(" 5 ").unwrap(), vec![5]);
    }

    #[test]
    fn parse_page_list_rejects_garbage() {
        assert!(parse_page_list("").is_err());
        assert!(parse_page_list("1,,2").is_err());
        assert!(parse_page_list("0").is_err());
        assert!(parse_page_list("0-3").is_err());
        assert!(parse_page_list("a-b").is_err());
        assert!(parse_page_list("two").is_err());
    }

    #[test]
    fn parse_page_list_rejects_huge_ranges() {
        for input in ["1-4294967295", "1-50000000", "70000", "4294967295-1"] {
            assert!(
                matches!(
                    parse_page_list(input),
                    Err(PdfEditError::InvalidPageList { .. })
                ),
                "{input}"
            );
        }
        let widest = format!("1-{MAX_PAGES}");
        assert_eq!(parse_page_list(&widest).unwrap().len(), MAX_PAGES as usize);
        assert!(parse_page_list(&format!("{widest},1")).is_err());
    }
}
