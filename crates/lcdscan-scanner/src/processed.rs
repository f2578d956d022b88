use lcdscan_core::PolicyId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Identifiers already claimed during the current run.
///
/// Shared by every strategy so that no identifier is fetched twice. Claiming
/// is atomic: exactly one caller wins for a given identifier.
#[derive(Debug, Clone, Default)]
pub struct ProcessedSet {
    inner: Arc<Mutex<HashSet<PolicyId>>>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` for processing. Returns `false` when it was already claimed.
    pub fn claim(&self, id: PolicyId) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id)
    }

    /// Give a claim back so a later probe may retry the identifier.
    pub fn release(&self, id: PolicyId) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    pub fn contains(&self, id: PolicyId) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once() {
        let set = ProcessedSet::new();
        let id = PolicyId::new(33822).unwrap();

        assert!(set.claim(id));
        assert!(!set.claim(id));
        assert!(set.contains(id));
        assert_eq!(set.len(), 1);

        set.release(id);
        assert!(!set.contains(id));
        assert!(set.claim(id));
    }

    #[tokio::test]
    async fn test_concurrent_claims_have_single_winner() {
        let set = ProcessedSet::new();
        let id = PolicyId::new(35000).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let set = set.clone();
                tokio::spawn(async move { set.claim(id) })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
