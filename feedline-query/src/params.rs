//! Raw request parameters.
//!
//! Parameters are multi-valued: `mentions` in particular may appear once per
//! mention group. Keys written with a trailing `[]` (`types[]=...`) are folded
//! into the bare key.

/// Ordered, multi-valued string parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedParams {
    pairs: Vec<(String, String)>,
}

impl FeedParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let key = key.strip_suffix("[]").map(str::to_string).unwrap_or(key);
        self.pairs.push((key, value.into()));
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        params.extend(pairs);
        params
    }

    /// Parse `a=1&b=two+words&c=%2C`.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.push(decode(key), decode(value));
        }
        params
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for FeedParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.push(key, value);
        }
    }
}

impl IntoIterator for FeedParams {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_string_decodes() {
        let params = FeedParams::from_query_string(
            "?mentions=alice+post1%2Ccarol&mentions=bob&limit=10&types[]=a&types[]=b",
        );
        assert_eq!(params.get_all("mentions"), vec!["alice post1,carol", "bob"]);
        assert_eq!(params.get("limit"), Some("10"));
        assert_eq!(params.get_all("types"), vec!["a", "b"]);
        assert_eq!(params.get("since"), None);
    }

    #[test]
    fn test_key_without_value() {
        let params = FeedParams::from_query_string("since&limit=");
        assert_eq!(params.get("since"), Some(""));
        assert_eq!(params.get("limit"), Some(""));
    }

    #[test]
    fn test_extend_keeps_existing_values() {
        let mut params = FeedParams::new().with("mentions", "alice");
        params.extend(FeedParams::from_query_string("mentions=bob&types[]=x"));
        assert_eq!(params.get_all("mentions"), vec!["alice", "bob"]);
        assert_eq!(params.get_all("types"), vec!["x"]);
    }

    #[test]
    fn test_from_pairs() {
        let params = FeedParams::from_pairs([("entities", "a,b"), ("sort_by", "published_at")]);
        assert_eq!(params.get("entities"), Some("a,b"));
        assert_eq!(params.get("sort_by"), Some("published_at"));
    }
}
