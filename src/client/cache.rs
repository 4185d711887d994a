use crate::codec::HttpResponse;
use crate::network::EndpointRef;
use std::collections::HashMap;

/// `Last-Modified` validators remembered per canonical URL
///
/// Entries are only ever added or overwritten, never evicted, and live as
/// long as the owning client.
#[derive(Debug, Default, Clone)]
pub struct RevalidationCache {
    entries: HashMap<String, i64>,
}

impl RevalidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator to send as `If-Modified-Since` for `endpoint`
    pub fn validator(&self, endpoint: &EndpointRef) -> Option<i64> {
        self.entries.get(&endpoint.to_string()).copied()
    }

    /// Records the `Last-Modified` of a 200 response
    ///
    /// Any other status, a missing header or a non-numeric value leaves the
    /// cache untouched. Returns whether an entry was written.
    pub fn observe(&mut self, endpoint: &EndpointRef, response: &HttpResponse) -> bool {
        if response.status_code != 200 {
            return false;
        }
        let Some(stamp) = response
            .header("Last-Modified")
            .and_then(|v| v.trim().parse::<i64>().ok())
        else {
            return false;
        };
        self.entries.insert(endpoint.to_string(), stamp);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status_code: i32, last_modified: Option<&str>) -> HttpResponse {
        let mut response = HttpResponse {
            status_code,
            ..Default::default()
        };
        if let Some(value) = last_modified {
            response
                .headers
                .insert("Last-Modified".to_string(), value.to_string());
        }
        response
    }

    #[test]
    fn test_ok_with_numeric_last_modified_is_cached() {
        let endpoint = EndpointRef::parse("http://localhost:8080/index.html").unwrap();
        let mut cache = RevalidationCache::new();
        assert!(cache.observe(&endpoint, &response(200, Some("1000"))));
        assert_eq!(cache.validator(&endpoint), Some(1000));

        assert!(cache.observe(&endpoint, &response(200, Some("2000"))));
        assert_eq!(cache.validator(&endpoint), Some(2000));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_not_modified_never_touches_cache() {
        let endpoint = EndpointRef::parse("http://localhost:8080/index.html").unwrap();
        let mut cache = RevalidationCache::new();
        cache.observe(&endpoint, &response(200, Some("1000")));

        assert!(!cache.observe(&endpoint, &response(304, Some("5000"))));
        assert_eq!(cache.validator(&endpoint), Some(1000));
    }

    #[test]
    fn test_bad_or_missing_values_are_ignored() {
        let endpoint = EndpointRef::parse("http://localhost:8080/a.png").unwrap();
        let mut cache = RevalidationCache::new();
        assert!(!cache.observe(&endpoint, &response(200, None)));
        assert!(!cache.observe(&endpoint, &response(200, Some("Tue, 15 Nov 1994"))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keyed_by_canonical_url() {
        let short = EndpointRef::parse("http://example.com/").unwrap();
        let explicit = EndpointRef::parse("http://example.com:80/").unwrap();
        let mut cache = RevalidationCache::new();
        cache.observe(&short, &response(200, Some("42")));
        assert_eq!(cache.validator(&explicit), Some(42));
    }
}
