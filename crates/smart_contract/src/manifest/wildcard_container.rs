//! A list of values or the wildcard `"*"`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Either a wildcard matching every value or an explicit list.
///
/// Serializes as the string `"*"` or as a JSON array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardContainer<T> {
    Wildcard,
    List(Vec<T>),
}

impl<T> WildcardContainer<T> {
    /// Creates a container holding the provided values.
    pub fn create(values: Vec<T>) -> Self {
        Self::List(values)
    }

    pub fn create_wildcard() -> Self {
        Self::Wildcard
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Returns the explicit values, or `None` for the wildcard.
    pub fn values(&self) -> Option<&[T]> {
        match self {
            Self::Wildcard => None,
            Self::List(values) => Some(values),
        }
    }

    /// Checks whether `value` is listed or matched by the wildcard.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self {
            Self::Wildcard => true,
            Self::List(values) => values.contains(value),
        }
    }
}

impl<T> Default for WildcardContainer<T> {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl<T: Serialize> Serialize for WildcardContainer<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Wildcard => serializer.serialize_str("*"),
            Self::List(values) => values.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for WildcardContainer<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) if s == "*" => Ok(Self::Wildcard),
            value @ Value::Array(_) => serde_json::from_value(value)
                .map(Self::List)
                .map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!(
                "expected '*' or an array, found {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_and_list_json() {
        let wildcard: WildcardContainer<String> = serde_json::from_str("\"*\"").unwrap();
        assert!(wildcard.is_wildcard());
        assert!(wildcard.contains(&"transfer".to_string()));
        assert_eq!(serde_json::to_string(&wildcard).unwrap(), "\"*\"");

        let list: WildcardContainer<String> = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert!(list.contains(&"b".to_string()));
        assert!(!list.contains(&"c".to_string()));
        assert_eq!(list.values().map(|v| v.len()), Some(2));

        assert!(serde_json::from_str::<WildcardContainer<String>>("\"a\"").is_err());
    }
}
