//! Ordered left→right term mapping for matching quizzes.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ValidationError};

/// Bijection between left terms and right terms.
///
/// Keys keep their insertion order, which becomes the left pool order of a
/// matching engine. Every key and every value is unique and non-blank, and
/// there is at least one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchingMap(IndexMap<String, String>);

impl MatchingMap {
    /// Build a map from ordered pairs, rejecting duplicates on either side.
    pub fn from_pairs<I, L, R>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        let mut map = IndexMap::new();
        let mut values = HashSet::new();

        for (left, right) in pairs {
            let (left, right) = (left.into(), right.into());
            if left.trim().is_empty() || right.trim().is_empty() {
                return Err(ValidationError::BlankTerm);
            }
            if map.contains_key(&left) {
                return Err(ValidationError::DuplicateKey(left));
            }
            if !values.insert(right.clone()) {
                return Err(ValidationError::DuplicateValue(right));
            }
            map.insert(left, right);
        }

        if map.is_empty() {
            return Err(ValidationError::EmptyMatchingMap);
        }
        Ok(Self(map))
    }

    /// Parse a JSON object such as `{"cat":"gato","dog":"perro"}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            // Validation failures surface through serde as custom messages;
            // recover the typed error where possible.
            match Self::revalidate(json) {
                Some(err) => err,
                None => ValidationError::MalformedMatchingMap(e.to_string()),
            }
        })
    }

    fn revalidate(json: &str) -> Option<ValidationError> {
        let pairs: OrderedPairs = serde_json::from_str(json).ok()?;
        Self::from_pairs(pairs.0).err()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The right term paired with `left`.
    pub fn get(&self, left: &str) -> Option<&str> {
        self.0.get(left).map(String::as_str)
    }

    pub fn is_pair(&self, left: &str, right: &str) -> bool {
        self.get(left) == Some(right)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(l, r)| (l.as_str(), r.as_str()))
    }
}

/// Raw key/value pairs in document order, duplicates included.
struct OrderedPairs(Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedPairs {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = OrderedPairs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping left terms to right terms")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    pairs.push((key, value));
                }
                Ok(OrderedPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

impl<'de> Deserialize<'de> for MatchingMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = OrderedPairs::deserialize(deserializer)?;
        MatchingMap::from_pairs(pairs.0).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn preserves_key_order_through_json() {
        let json = r#"{"zebra":"cebra","apple":"manzana","moon":"luna"}"#;
        let map = MatchingMap::from_json_str(json).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zebra", "apple", "moon"]);

        let encoded = serde_json::to_string(&map).unwrap();
        assert_eq!(encoded, json);

        let decoded: MatchingMap = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, map);
        assert_eq!(decoded.iter().collect::<Vec<_>>(), map.iter().collect::<Vec<_>>());
    }

    #[test]
    fn rejects_duplicate_key_in_document() {
        let err = MatchingMap::from_json_str(r#"{"cat":"gato","cat":"felino"}"#).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateKey("cat".to_string()));
    }

    #[test]
    fn rejects_duplicate_value() {
        let err = MatchingMap::from_pairs([("big", "grande"), ("large", "grande")]).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateValue("grande".to_string()));
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert_eq!(
            MatchingMap::from_json_str("{}").unwrap_err(),
            ValidationError::EmptyMatchingMap
        );
        assert_eq!(
            MatchingMap::from_pairs([("  ", "x")]).unwrap_err(),
            ValidationError::BlankTerm
        );
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = MatchingMap::from_json_str("[1,2]").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedMatchingMap(_)));
    }

    #[test]
    fn lookup() {
        let map = MatchingMap::from_pairs([("hot", "caliente"), ("cold", "frío")]).unwrap();
        assert!(map.is_pair("cold", "frío"));
        assert!(!map.is_pair("cold", "caliente"));
        assert_eq!(map.get("warm"), None);
        assert_eq!(map.len(), 2);
    }
}
