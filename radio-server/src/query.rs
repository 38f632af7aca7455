//! Search parameter normalization and cache keys.
//!
//! Parameters are normalized before both transmission and cache lookup so
//! that logically equal searches produce the same request and the same
//! key: blank values are dropped, text is trimmed, and any value holding
//! non-ASCII text is put into Unicode canonical composition (NFC). A term
//! typed with combining marks and its precomposed spelling are therefore
//! sent, and cached, identically.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Sort order accepted by `/stations/search`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    Name,
    Url,
    Homepage,
    Favicon,
    Tags,
    Country,
    State,
    Language,
    Votes,
    Codec,
    Bitrate,
    LastCheckOk,
    LastCheckTime,
    ClickTimestamp,
    ClickCount,
    ClickTrend,
    ChangeTimestamp,
    Random,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Name => "name",
            Order::Url => "url",
            Order::Homepage => "homepage",
            Order::Favicon => "favicon",
            Order::Tags => "tags",
            Order::Country => "country",
            Order::State => "state",
            Order::Language => "language",
            Order::Votes => "votes",
            Order::Codec => "codec",
            Order::Bitrate => "bitrate",
            Order::LastCheckOk => "lastcheckok",
            Order::LastCheckTime => "lastchecktime",
            Order::ClickTimestamp => "clicktimestamp",
            Order::ClickCount => "clickcount",
            Order::ClickTrend => "clicktrend",
            Order::ChangeTimestamp => "changetimestamp",
            Order::Random => "random",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw parameter value before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl ParamValue {
    fn to_text(&self) -> String {
        match self {
            ParamValue::Text(s) => s.clone(),
            ParamValue::Int(n) => n.to_string(),
            ParamValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Int(n)
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        ParamValue::Int(n.into())
    }
}

impl From<usize> for ParamValue {
    fn from(n: usize) -> Self {
        ParamValue::Int(n as i64)
    }
}

impl From<Order> for ParamValue {
    fn from(o: Order) -> Self {
        ParamValue::Text(o.as_str().to_string())
    }
}

/// Search parameters for `/stations/search`.
///
/// Setting a key twice keeps the last value. Insertion order has no effect
/// on the transmitted query or the cache key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    params: Vec<(String, ParamValue)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary parameter.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        self.set("name", name.into())
    }

    pub fn country(self, country: impl Into<String>) -> Self {
        self.set("country", country.into())
    }

    pub fn countrycode(self, code: impl Into<String>) -> Self {
        self.set("countrycode", code.into())
    }

    pub fn state(self, state: impl Into<String>) -> Self {
        self.set("state", state.into())
    }

    pub fn language(self, language: impl Into<String>) -> Self {
        self.set("language", language.into())
    }

    pub fn tag(self, tag: impl Into<String>) -> Self {
        self.set("tag", tag.into())
    }

    pub fn codec(self, codec: impl Into<String>) -> Self {
        self.set("codec", codec.into())
    }

    pub fn order(self, order: Order) -> Self {
        self.set("order", order)
    }

    pub fn reverse(self, reverse: bool) -> Self {
        self.set("reverse", reverse)
    }

    pub fn limit(self, limit: usize) -> Self {
        self.set("limit", limit)
    }

    pub fn offset(self, offset: usize) -> Self {
        self.set("offset", offset)
    }

    pub fn hidebroken(self, hide: bool) -> Self {
        self.set("hidebroken", hide)
    }

    /// Raw value for `key`, if set.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Normalize for transmission and caching.
    pub fn normalize(&self) -> NormalizedQuery {
        let pairs = self
            .params
            .iter()
            .filter_map(|(key, value)| {
                let text = normalize_text(&value.to_text());
                (!text.is_empty()).then(|| (key.clone(), text))
            })
            .collect();
        NormalizedQuery { pairs }
    }
}

impl<K, V> FromIterator<(K, V)> for SearchParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(SearchParams::new(), |params, (k, v)| params.set(k, v))
    }
}

/// Trim, and compose non-ASCII text into NFC.
pub fn normalize_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_ascii() {
        trimmed.to_string()
    } else {
        trimmed.nfc().collect()
    }
}

/// Parameters after normalization, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    pairs: BTreeMap<String, String>,
}

impl NormalizedQuery {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Query pairs ready for a request.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.pairs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Stable cache key for this query.
    pub fn cache_key(&self) -> String {
        let object = self
            .pairs
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        stable_serialize(&Value::Object(object))
    }
}

/// Deterministic text form of a JSON value.
///
/// Object keys are sorted, arrays keep their order, and primitives use
/// their JSON text. Logically equal values always serialize identically,
/// whatever order their keys were inserted in.
pub fn stable_serialize(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(stable_serialize).collect();
            format!("[{}]", inner.join(","))
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let inner: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), stable_serialize(v)))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        primitive => primitive.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_and_whitespace_values_dropped() {
        let q = SearchParams::new()
            .name("  ")
            .tag("")
            .language(" french ")
            .normalize();

        assert_eq!(q.len(), 1);
        assert_eq!(q.get("language"), Some("french"));
    }

    #[test]
    fn values_coerced_to_text() {
        let q = SearchParams::new()
            .limit(10)
            .reverse(true)
            .hidebroken(false)
            .order(Order::ClickCount)
            .normalize();

        assert_eq!(q.get("limit"), Some("10"));
        assert_eq!(q.get("reverse"), Some("true"));
        assert_eq!(q.get("hidebroken"), Some("false"));
        assert_eq!(q.get("order"), Some("clickcount"));
    }

    #[test]
    fn combining_marks_compose() {
        let decomposed = SearchParams::new().name("Cafe\u{0301} Jazz").normalize();
        let precomposed = SearchParams::new().name("Caf\u{00e9} Jazz").normalize();

        assert_eq!(decomposed.get("name"), Some("Caf\u{00e9} Jazz"));
        assert_eq!(decomposed, precomposed);
        assert_eq!(decomposed.cache_key(), precomposed.cache_key());
    }

    #[test]
    fn cjk_text_passes_through_trimmed() {
        let q = SearchParams::new().name(" 北京音乐广播 ").normalize();
        assert_eq!(q.get("name"), Some("北京音乐广播"));
    }

    #[test]
    fn later_set_overrides_earlier() {
        let params = SearchParams::new().limit(5).limit(20);
        assert_eq!(params.get("limit"), Some(&ParamValue::Int(20)));
    }

    #[test]
    fn insertion_order_does_not_change_key() {
        let a = SearchParams::new().tag("jazz").limit(10).countrycode("DE");
        let b = SearchParams::new().countrycode("DE").tag("jazz").limit(10);
        assert_eq!(a.normalize().cache_key(), b.normalize().cache_key());
    }

    #[test]
    fn different_values_give_different_keys() {
        let a = SearchParams::new().tag("jazz").normalize();
        let b = SearchParams::new().tag("rock").normalize();
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn cache_key_format() {
        let q = SearchParams::new().tag("jazz").limit(10).normalize();
        assert_eq!(q.cache_key(), r#"{"limit":"10","tag":"jazz"}"#);
    }

    #[test]
    fn stable_serialize_nested() {
        let a = json!({"b": [3, {"y": 1, "x": null}], "a": "s", "c": true});
        assert_eq!(
            stable_serialize(&a),
            r#"{"a":"s","b":[3,{"x":null,"y":1}],"c":true}"#
        );
    }

    #[test]
    fn stable_serialize_quotes_keys() {
        // Keys containing separators cannot collide with structure.
        let a = json!({"a\":\"b": "c"});
        let b = json!({"a": "b\":\"c"});
        assert_ne!(stable_serialize(&a), stable_serialize(&b));
    }

    #[test]
    fn from_iterator_builds_params() {
        let params: SearchParams = vec![("name", "jazz"), ("limit", "5")].into_iter().collect();
        assert_eq!(params.normalize().get("limit"), Some("5"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Distinct keys paired with printable values.
    fn param_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
        proptest::collection::btree_map("[a-z]{1,8}", "[ -~]{0,12}", 0..8)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        /// Any permutation of the same parameters yields the same cache key.
        #[test]
        fn key_independent_of_insertion_order(
            (original, shuffled) in param_pairs().prop_flat_map(|pairs| {
                (Just(pairs.clone()), Just(pairs).prop_shuffle())
            })
        ) {
            let a: SearchParams = original.into_iter().collect();
            let b: SearchParams = shuffled.into_iter().collect();
            prop_assert_eq!(a.normalize().cache_key(), b.normalize().cache_key());
        }

        /// Decomposed and composed spellings normalize identically.
        #[test]
        fn nfd_and_nfc_normalize_identically(s in "[a-zA-Z\u{00C0}-\u{00FF}\u{0300}-\u{036F} ]{0,24}") {
            let nfd: String = s.nfd().collect();
            let nfc: String = s.nfc().collect();
            prop_assert_eq!(normalize_text(&nfd), normalize_text(&nfc));
        }

        /// Normalized values never carry surrounding whitespace and are never empty.
        #[test]
        fn normalized_values_trimmed_and_non_empty(pairs in param_pairs()) {
            let params: SearchParams = pairs.into_iter().collect();
            let normalized = params.normalize();
            for (_, v) in normalized.pairs() {
                prop_assert!(!v.is_empty());
                prop_assert_eq!(v.trim(), v.as_str());
            }
        }
    }
}
