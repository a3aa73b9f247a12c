use serde::{Deserialize, Serialize};

/// Paginated list response.
///
/// Endpoints report either `totalPages` or `totalElements` (sometimes both).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
}

impl<T> Page<T> {
    /// Page count, derived from `totalElements` when `totalPages` is absent.
    pub fn page_count(&self, page_size: u32) -> u32 {
        if let Some(pages) = self.total_pages {
            return pages;
        }
        match (self.total_elements, page_size) {
            (Some(total), size) if size > 0 => total.div_ceil(u64::from(size)) as u32,
            _ => u32::from(!self.content.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_with_total_pages() {
        let page: Page<String> =
            serde_json::from_str(r#"{"content":["a","b"],"totalPages":7}"#).unwrap();
        assert_eq!(page.content, vec!["a", "b"]);
        assert_eq!(page.page_count(2), 7);
    }

    #[test]
    fn test_page_count_from_total_elements() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"content":[1,2,3],"totalElements":41}"#).unwrap();
        assert_eq!(page.total_pages, None);
        assert_eq!(page.page_count(20), 3);
        assert_eq!(page.page_count(0), 1);
    }

    #[test]
    fn test_page_without_totals() {
        let page: Page<u32> = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert_eq!(page.page_count(20), 0);
    }
}
