//! Query options for views and Mango `_find` requests
//!
//! [`ViewOptions`] encodes to a URL query string, [`FindOptions`] to a JSON
//! request body. Selectors for `_find` can be written as raw JSON or built
//! with [`field`], [`and`], [`or`] and [`not`].

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDir::Asc => write!(f, "asc"),
            SortDir::Desc => write!(f, "desc"),
        }
    }
}

/// Whether a view is brought up to date before it answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    True,
    False,
    Lazy,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateMode::True => write!(f, "true"),
            UpdateMode::False => write!(f, "false"),
            UpdateMode::Lazy => write!(f, "lazy"),
        }
    }
}

/// Options for `GET /{db}/_design/{ddoc}/_view/{view}`
///
/// Every field defaults to the server's own default, and only values that
/// differ from it are put on the query string. Key-like options hold JSON
/// text exactly as the server should receive it (`"\"alice\""`, `[1,2]`).
///
/// # Example
/// ```
/// use couchdriver::query::ViewOptions;
///
/// let qs = ViewOptions::new().include_docs(true).limit(10).to_query_string();
/// assert_eq!(qs, "include_docs=true&limit=10");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    pub conflicts: bool,
    pub descending: bool,
    pub end_key: Option<String>,
    pub end_key_doc_id: Option<String>,
    pub group: bool,
    pub group_level: Option<u64>,
    pub include_docs: bool,
    pub attachments: bool,
    pub att_encoding_info: bool,
    pub inclusive_end: bool,
    pub key: Option<String>,
    /// Sent as a single comma-joined `keys` parameter.
    pub keys: Vec<String>,
    pub limit: Option<u64>,
    pub reduce: bool,
    pub skip: Option<u64>,
    pub sorted: bool,
    pub stable: bool,
    pub start_key: Option<String>,
    pub start_key_doc_id: Option<String>,
    pub update: Option<UpdateMode>,
    pub update_seq: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            conflicts: false,
            descending: false,
            end_key: None,
            end_key_doc_id: None,
            group: false,
            group_level: None,
            include_docs: false,
            attachments: false,
            att_encoding_info: false,
            inclusive_end: true,
            key: None,
            keys: Vec::new(),
            limit: None,
            reduce: true,
            skip: None,
            sorted: true,
            stable: false,
            start_key: None,
            start_key_doc_id: None,
            update: None,
            update_seq: false,
        }
    }
}

impl ViewOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conflicts(mut self, on: bool) -> Self {
        self.conflicts = on;
        self
    }

    pub fn descending(mut self, on: bool) -> Self {
        self.descending = on;
        self
    }

    pub fn end_key(mut self, json: impl Into<String>) -> Self {
        self.end_key = Some(json.into());
        self
    }

    pub fn end_key_doc_id(mut self, id: impl Into<String>) -> Self {
        self.end_key_doc_id = Some(id.into());
        self
    }

    pub fn group(mut self, on: bool) -> Self {
        self.group = on;
        self
    }

    pub fn group_level(mut self, level: u64) -> Self {
        self.group_level = Some(level);
        self
    }

    pub fn include_docs(mut self, on: bool) -> Self {
        self.include_docs = on;
        self
    }

    pub fn attachments(mut self, on: bool) -> Self {
        self.attachments = on;
        self
    }

    pub fn att_encoding_info(mut self, on: bool) -> Self {
        self.att_encoding_info = on;
        self
    }

    pub fn inclusive_end(mut self, on: bool) -> Self {
        self.inclusive_end = on;
        self
    }

    pub fn key(mut self, json: impl Into<String>) -> Self {
        self.key = Some(json.into());
        self
    }

    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn reduce(mut self, on: bool) -> Self {
        self.reduce = on;
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    pub fn sorted(mut self, on: bool) -> Self {
        self.sorted = on;
        self
    }

    pub fn stable(mut self, on: bool) -> Self {
        self.stable = on;
        self
    }

    pub fn start_key(mut self, json: impl Into<String>) -> Self {
        self.start_key = Some(json.into());
        self
    }

    pub fn start_key_doc_id(mut self, id: impl Into<String>) -> Self {
        self.start_key_doc_id = Some(id.into());
        self
    }

    pub fn update(mut self, mode: UpdateMode) -> Self {
        self.update = Some(mode);
        self
    }

    pub fn update_seq(mut self, on: bool) -> Self {
        self.update_seq = on;
        self
    }

    /// Parameters that differ from the server defaults, sorted by name and
    /// not yet percent-encoded.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = Vec::new();

        let flags = [
            ("conflicts", self.conflicts, false),
            ("descending", self.descending, false),
            ("group", self.group, false),
            ("include_docs", self.include_docs, false),
            ("attachments", self.attachments, false),
            ("att_encoding_info", self.att_encoding_info, false),
            ("inclusive_end", self.inclusive_end, true),
            ("reduce", self.reduce, true),
            ("sorted", self.sorted, true),
            ("stable", self.stable, false),
            ("update_seq", self.update_seq, false),
        ];
        for (name, value, default) in flags {
            if value != default {
                pairs.push((name, value.to_string()));
            }
        }

        let texts = [
            ("endkey", &self.end_key),
            ("endkey_docid", &self.end_key_doc_id),
            ("key", &self.key),
            ("startkey", &self.start_key),
            ("startkey_docid", &self.start_key_doc_id),
        ];
        for (name, value) in texts {
            if let Some(v) = value {
                pairs.push((name, v.clone()));
            }
        }

        let numbers = [
            ("group_level", self.group_level),
            ("limit", self.limit),
            ("skip", self.skip),
        ];
        for (name, value) in numbers {
            if let Some(n) = value {
                pairs.push((name, n.to_string()));
            }
        }

        if let Some(mode) = self.update {
            pairs.push(("update", mode.to_string()));
        }

        if !self.keys.is_empty() {
            pairs.push(("keys", self.keys.join(",")));
        }

        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    /// Percent-encoded query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        self.to_query_pairs()
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Filter condition for Mango selectors
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, serde_json::Value),
    Ne(String, serde_json::Value),
    Gt(String, serde_json::Value),
    Gte(String, serde_json::Value),
    Lt(String, serde_json::Value),
    Lte(String, serde_json::Value),
    In(String, Vec<serde_json::Value>),
    NotIn(String, Vec<serde_json::Value>),
    Contains(String, String),
    StartsWith(String, String),
    EndsWith(String, String),
    Regex(String, String),
    Exists(String, bool),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// Convert to a Mango selector
    pub fn to_selector(&self) -> serde_json::Value {
        match self {
            Filter::Eq(field, value) => json!({ field: {"$eq": value} }),
            Filter::Ne(field, value) => json!({ field: {"$ne": value} }),
            Filter::Gt(field, value) => json!({ field: {"$gt": value} }),
            Filter::Gte(field, value) => json!({ field: {"$gte": value} }),
            Filter::Lt(field, value) => json!({ field: {"$lt": value} }),
            Filter::Lte(field, value) => json!({ field: {"$lte": value} }),
            Filter::In(field, values) => json!({ field: {"$in": values} }),
            Filter::NotIn(field, values) => json!({ field: {"$nin": values} }),
            Filter::Contains(field, value) => {
                json!({ field: {"$regex": regex::escape(value)} })
            }
            Filter::StartsWith(field, value) => {
                json!({ field: {"$regex": format!("^{}", regex::escape(value))} })
            }
            Filter::EndsWith(field, value) => {
                json!({ field: {"$regex": format!("{}$", regex::escape(value))} })
            }
            Filter::Regex(field, pattern) => json!({ field: {"$regex": pattern} }),
            Filter::Exists(field, value) => json!({ field: {"$exists": value} }),
            Filter::And(conditions) => {
                let parts: Vec<serde_json::Value> =
                    conditions.iter().map(|c| c.to_selector()).collect();
                json!({ "$and": parts })
            }
            Filter::Or(conditions) => {
                let parts: Vec<serde_json::Value> =
                    conditions.iter().map(|c| c.to_selector()).collect();
                json!({ "$or": parts })
            }
            Filter::Not(condition) => json!({ "$not": condition.to_selector() }),
        }
    }
}

impl From<Filter> for serde_json::Value {
    fn from(filter: Filter) -> Self {
        filter.to_selector()
    }
}

/// Field expression builder for fluent filter construction
pub struct Field {
    name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn eq(self, value: impl Into<serde_json::Value>) -> Filter {
        Filter::Eq(self.name, value.into())
    }

    pub fn ne(self, value: impl Into<serde_json::Value>) -> Filter {
        Filter::Ne(self.name, value.into())
    }

    pub fn gt(self, value: impl Into<serde_json::Value>) -> Filter {
        Filter::Gt(self.name, value.into())
    }

    pub fn gte(self, value: impl Into<serde_json::Value>) -> Filter {
        Filter::Gte(self.name, value.into())
    }

    pub fn lt(self, value: impl Into<serde_json::Value>) -> Filter {
        Filter::Lt(self.name, value.into())
    }

    pub fn lte(self, value: impl Into<serde_json::Value>) -> Filter {
        Filter::Lte(self.name, value.into())
    }

    pub fn is_in(self, values: Vec<serde_json::Value>) -> Filter {
        Filter::In(self.name, values)
    }

    pub fn not_in(self, values: Vec<serde_json::Value>) -> Filter {
        Filter::NotIn(self.name, values)
    }

    pub fn contains(self, value: impl Into<String>) -> Filter {
        Filter::Contains(self.name, value.into())
    }

    pub fn starts_with(self, value: impl Into<String>) -> Filter {
        Filter::StartsWith(self.name, value.into())
    }

    pub fn ends_with(self, value: impl Into<String>) -> Filter {
        Filter::EndsWith(self.name, value.into())
    }

    pub fn matches(self, pattern: impl Into<String>) -> Filter {
        Filter::Regex(self.name, pattern.into())
    }

    pub fn exists(self, value: bool) -> Filter {
        Filter::Exists(self.name, value)
    }
}

/// Create a field expression
pub fn field(name: impl Into<String>) -> Field {
    Field::new(name)
}

/// Combine filters with AND
pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::And(filters)
}

/// Combine filters with OR
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::Or(filters)
}

/// Negate a filter
pub fn not(filter: Filter) -> Filter {
    Filter::Not(Box::new(filter))
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_true(b: &bool) -> bool {
    *b
}

fn default_true() -> bool {
    true
}

fn empty_selector() -> serde_json::Value {
    json!({})
}

/// Body of `POST /{db}/_find`
///
/// # Example
/// ```
/// use couchdriver::query::{field, and, FindOptions, SortDir};
///
/// let opts = FindOptions::new()
///     .selector(and(vec![field("credits").lt(666), field("type").eq("user")]))
///     .sort("name", SortDir::Asc)
///     .limit(3);
/// let body = serde_json::to_value(&opts).unwrap();
/// assert_eq!(body["limit"], 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    #[serde(default = "empty_selector")]
    pub selector: serde_json::Value,
    /// Server default is 25.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub use_index: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub conflicts: bool,
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub read_quorum: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub update: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub stable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub execution_stats: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            selector: empty_selector(),
            limit: None,
            skip: None,
            sort: Vec::new(),
            fields: Vec::new(),
            use_index: Vec::new(),
            conflicts: false,
            read_quorum: None,
            bookmark: None,
            update: true,
            stable: false,
            execution_stats: false,
        }
    }
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selector from a built filter or raw JSON
    pub fn selector(mut self, selector: impl Into<serde_json::Value>) -> Self {
        self.selector = selector.into();
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    /// Sort by field
    pub fn sort(mut self, field: impl Into<String>, direction: SortDir) -> Self {
        let name: String = field.into();
        self.sort.push(json!({ name: direction.to_string() }));
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Hint a design document, or a design document and index name
    pub fn use_index<I, S>(mut self, index: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.use_index = index.into_iter().map(Into::into).collect();
        self
    }

    pub fn conflicts(mut self, on: bool) -> Self {
        self.conflicts = on;
        self
    }

    pub fn read_quorum(mut self, r: u64) -> Self {
        self.read_quorum = Some(r);
        self
    }

    /// Continue from a previous response's bookmark
    pub fn bookmark(mut self, bookmark: impl Into<String>) -> Self {
        self.bookmark = Some(bookmark.into());
        self
    }

    pub fn update(mut self, on: bool) -> Self {
        self.update = on;
        self
    }

    pub fn stable(mut self, on: bool) -> Self {
        self.stable = on;
        self
    }

    pub fn execution_stats(mut self, on: bool) -> Self {
        self.execution_stats = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_view_options_are_empty() {
        assert!(ViewOptions::default().to_query_pairs().is_empty());
        assert_eq!(ViewOptions::new().to_query_string(), "");
    }

    #[test]
    fn test_sorted_false_is_sent() {
        let qs = ViewOptions::new().sorted(false).to_query_string();
        assert_eq!(qs, "sorted=false");
    }

    #[test]
    fn test_pairs_are_sorted_by_name() {
        let pairs = ViewOptions::new()
            .skip(5)
            .attachments(true)
            .att_encoding_info(true)
            .to_query_pairs();
        let names: Vec<&str> = pairs.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["att_encoding_info", "attachments", "skip"]);
    }

    #[test]
    fn test_update_mode() {
        let qs = ViewOptions::new().update(UpdateMode::Lazy).to_query_string();
        assert_eq!(qs, "update=lazy");
    }

    #[test]
    fn test_key_is_percent_encoded() {
        let qs = ViewOptions::new().key(r#""a b""#).to_query_string();
        assert_eq!(qs, "key=%22a%20b%22");
    }

    #[test]
    fn test_simple_selector() {
        let sel = field("age").gt(21).to_selector();
        assert_eq!(sel, json!({"age": {"$gt": 21}}));
    }

    #[test]
    fn test_starts_with_escapes() {
        let sel = field("email").starts_with("a.b").to_selector();
        assert_eq!(sel, json!({"email": {"$regex": "^a\\.b"}}));
    }

    #[test]
    fn test_and_filter() {
        let sel = and(vec![field("age").gt(21), field("active").eq(true)]).to_selector();
        assert_eq!(
            sel,
            json!({"$and": [{"age": {"$gt": 21}}, {"active": {"$eq": true}}]})
        );
    }

    #[test]
    fn test_default_find_body() {
        let body = serde_json::to_value(FindOptions::new()).unwrap();
        assert_eq!(body, json!({"selector": {}}));
    }
}
