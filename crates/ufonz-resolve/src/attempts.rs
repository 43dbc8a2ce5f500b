use std::collections::HashSet;

/// Queries already submitted during one resolve call, in submission order.
///
/// Created fresh for every call and dropped with it; nothing is cached
/// between Sightings.
#[derive(Debug, Default)]
pub struct AttemptSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl AttemptSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `query`. Returns `false` if it was already recorded.
    pub fn insert(&mut self, query: &str) -> bool {
        if self.seen.contains(query) {
            return false;
        }
        self.seen.insert(query.to_owned());
        self.order.push(query.to_owned());
        true
    }

    #[must_use]
    pub fn contains(&self, query: &str) -> bool {
        self.seen.contains(query)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Copy of every query recorded so far. Strategies iterate this while
    /// new queries are still being recorded.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.order.clone()
    }

    #[must_use]
    pub fn into_queries(self) -> Vec<String> {
        self.order
    }
}
