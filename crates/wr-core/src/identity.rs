//! Post identity extraction
//!
//! A post is identified by a composite key built from attributes the host
//! page exposes on each post element. The attribute names are host markup
//! knowledge and can change under us, so extraction sits behind a strategy
//! trait: the wasm shell plugs in DOM-backed sources, tests and the CLI plug
//! in map-backed ones.

use std::collections::BTreeMap;
use std::fmt;

/// Composite key uniquely naming a post on the current page.
///
/// Built as `author-viewcontext-id`. Immutable once created; discarded
/// wholesale on every hard reset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostId(String);

impl PostId {
    /// Compose a post id from its three identifying parts.
    pub fn compose(author: &str, view_context: &str, id: &str) -> Self {
        Self(format!("{author}-{view_context}-{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for PostId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can answer attribute lookups for a post element.
pub trait PostSource {
    fn attribute(&self, name: &str) -> Option<String>;
}

impl PostSource for BTreeMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Pluggable extraction seam: turns a post source into a [`PostId`], or
/// `None` when the source does not carry the expected identity.
pub trait ExtractionStrategy {
    fn extract(&self, source: &dyn PostSource) -> Option<PostId>;
}

/// Default strategy: read three named attributes and join them.
///
/// A missing or empty attribute means the element is simply not a trackable
/// post. That is not an error; the element stays untracked.
#[derive(Debug, Clone)]
pub struct AttributeTriple {
    pub author_attr: String,
    pub context_attr: String,
    pub id_attr: String,
}

impl Default for AttributeTriple {
    fn default() -> Self {
        Self {
            author_attr: "user-id".to_string(),
            context_attr: "view-context".to_string(),
            id_attr: "id".to_string(),
        }
    }
}

impl ExtractionStrategy for AttributeTriple {
    fn extract(&self, source: &dyn PostSource) -> Option<PostId> {
        let author = non_empty(source.attribute(&self.author_attr))?;
        let context = non_empty(source.attribute(&self.context_attr))?;
        let id = non_empty(source.attribute(&self.id_attr))?;
        let post_id = PostId::compose(&author, &context, &id);
        log::trace!("extracted post id {post_id}");
        Some(post_id)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_composes_all_three_attributes() {
        let strategy = AttributeTriple::default();
        let src = source(&[("user-id", "u42"), ("view-context", "feed"), ("id", "t3_abc")]);
        let id = strategy.extract(&src).unwrap();
        assert_eq!(id.as_str(), "u42-feed-t3_abc");
    }

    #[test]
    fn test_extract_requires_every_attribute() {
        let strategy = AttributeTriple::default();
        for missing in ["user-id", "view-context", "id"] {
            let mut src = source(&[("user-id", "u42"), ("view-context", "feed"), ("id", "t3_abc")]);
            src.remove(missing);
            assert_eq!(strategy.extract(&src), None, "missing {missing}");
        }
    }

    #[test]
    fn test_empty_attribute_counts_as_missing() {
        let strategy = AttributeTriple::default();
        let src = source(&[("user-id", ""), ("view-context", "feed"), ("id", "t3_abc")]);
        assert_eq!(strategy.extract(&src), None);
    }

    #[test]
    fn test_custom_attribute_names() {
        let strategy = AttributeTriple {
            author_attr: "data-author".into(),
            context_attr: "data-surface".into(),
            id_attr: "data-post".into(),
        };
        let src = source(&[("data-author", "a"), ("data-surface", "s"), ("data-post", "p")]);
        assert_eq!(strategy.extract(&src).unwrap().as_str(), "a-s-p");
    }
}
