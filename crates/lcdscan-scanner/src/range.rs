use crate::error::{Result, ScanError};
use lcdscan_core::{PolicyId, RangeSpec};
use std::fmt;

/// A validated half-open identifier range `[start, end)` walked at a fixed stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    start: u64,
    end: u64,
    stride: u64,
}

impl SearchRange {
    pub fn new(start: u64, end: u64, stride: u64) -> Result<Self> {
        RangeSpec::new(start, end, stride)
            .validate()
            .map_err(ScanError::Config)?;
        Ok(Self { start, end, stride })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Number of candidates the range yields.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).div_ceil(self.stride)
        }
    }

    /// Candidates in ascending order: `start, start + stride, ...` below `end`.
    pub fn candidates(&self) -> impl Iterator<Item = PolicyId> {
        let stride = usize::try_from(self.stride).unwrap_or(usize::MAX);
        (self.start..self.end)
            .step_by(stride)
            .filter_map(|value| PolicyId::new(value).ok())
    }

    /// Whether one stride already reaches past the end of the span.
    pub fn stride_covers_span(&self) -> bool {
        self.stride >= self.end.saturating_sub(self.start)
    }

    /// The same span at a finer stride.
    ///
    /// `None` once the stride is 1 or already covers the whole span.
    pub fn refined(&self, factor: u64) -> Option<Self> {
        if self.stride <= 1 || self.stride_covers_span() {
            return None;
        }
        let stride = (self.stride / factor.max(2)).max(1);
        Some(Self { stride, ..*self })
    }
}

impl TryFrom<&RangeSpec> for SearchRange {
    type Error = ScanError;

    fn try_from(spec: &RangeSpec) -> Result<Self> {
        Self::new(spec.start, spec.end, spec.stride)
    }
}

impl fmt::Display for SearchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) step {}", self.start, self.end, self.stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(range: &SearchRange) -> Vec<u64> {
        range.candidates().map(|id| id.get()).collect()
    }

    #[test]
    fn test_candidates_are_half_open() {
        let range = SearchRange::new(33000, 33200, 50).unwrap();
        assert_eq!(values(&range), vec![33000, 33050, 33100, 33150]);
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn test_uneven_span() {
        let range = SearchRange::new(10, 25, 10).unwrap();
        assert_eq!(values(&range), vec![10, 20]);
        assert_eq!(range.len(), 2);
    }

    #[test]
    fn test_empty_range_yields_nothing() {
        let range = SearchRange::new(500, 500, 10).unwrap();
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert!(values(&range).is_empty());
    }

    #[test]
    fn test_invalid_ranges_are_rejected() {
        assert!(matches!(
            SearchRange::new(100, 50, 10),
            Err(ScanError::Config(_))
        ));
        assert!(SearchRange::new(100, 200, 0).is_err());
        assert!(SearchRange::new(0, 200, 10).is_err());
    }

    #[test]
    fn test_refined_divides_stride() {
        let range = SearchRange::new(33000, 34000, 50).unwrap();
        let finer = range.refined(5).unwrap();
        assert_eq!(finer.stride(), 10);
        assert_eq!(finer.start(), 33000);
        assert_eq!(finer.end(), 34000);

        let finest = SearchRange::new(1, 10, 3).unwrap().refined(5).unwrap();
        assert_eq!(finest.stride(), 1);
        assert!(finest.refined(5).is_none());
    }

    #[test]
    fn test_stride_covering_span_is_not_refined() {
        let single = SearchRange::new(1000, 1040, 50).unwrap();
        assert!(single.stride_covers_span());
        assert_eq!(single.len(), 1);
        assert!(single.refined(5).is_none());

        let exact = SearchRange::new(1000, 1050, 50).unwrap();
        assert!(exact.refined(5).is_none());

        let empty = SearchRange::new(500, 500, 10).unwrap();
        assert!(empty.refined(5).is_none());

        assert!(!SearchRange::new(1000, 1051, 50).unwrap().stride_covers_span());
    }

    #[test]
    fn test_from_spec() {
        let spec = RangeSpec::new(25000, 30000, 200);
        let range = SearchRange::try_from(&spec).unwrap();
        assert_eq!(range.len(), 25);
        assert_eq!(range.to_string(), "[25000, 30000) step 200");
    }
}
