use crate::domain::error::DomainError;

/// A validated, 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// `per_page` defaults to `default_size` and is clamped to `max_size`.
    pub fn new(
        page: u64,
        per_page: Option<u64>,
        default_size: u64,
        max_size: u64,
    ) -> Result<Self, DomainError> {
        if page == 0 {
            return Err(DomainError::validation("page", "pages are numbered from 1"));
        }
        let per_page = per_page.unwrap_or(default_size);
        if per_page == 0 {
            return Err(DomainError::validation("per_page", "must be at least 1"));
        }
        Ok(Self {
            page,
            per_page: per_page.min(max_size.max(1)),
        })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_zero_is_rejected() {
        assert!(matches!(
            PageRequest::new(0, None, 25, 100),
            Err(DomainError::Validation { .. })
        ));
        assert!(PageRequest::new(1, Some(0), 25, 100).is_err());
    }

    #[test]
    fn per_page_is_defaulted_and_clamped() {
        let p = PageRequest::new(3, None, 25, 100).unwrap();
        assert_eq!((p.per_page, p.offset()), (25, 50));

        let p = PageRequest::new(1, Some(1_000), 25, 100).unwrap();
        assert_eq!(p.per_page, 100);
    }
}
