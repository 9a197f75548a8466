/// Optional filters for a pull.
///
/// Filters are sent as URL query parameters in the order they were added.
///
/// ```rust
/// use veracross::Query;
///
/// let query = Query::new()
///     .filter("grade_level", 9)
///     .filter("updated_after", "2024-01-01")
///     .page_size(500);
///
/// assert_eq!(query.filters().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<(String, String)>,
    page_size: Option<u32>,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((key.into(), value.to_string()));
        self
    }

    /// Overrides the client's page size for this pull.
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Returns the filters in insertion order.
    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    pub(crate) fn page_size_override(&self) -> Option<u32> {
        self.page_size
    }
}

impl<K, V> FromIterator<(K, V)> for Query
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Query::new(), |query, (k, v)| query.filter(k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let query: Query = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(
            query.filters(),
            [("b".to_string(), "2".to_string()), ("a".to_string(), "1".to_string())]
        );
        assert_eq!(query.page_size_override(), None);
    }
}
