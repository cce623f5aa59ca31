use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single field of a partial update.
///
/// `Keep` leaves the stored value alone; `Set` overwrites it, even with an
/// empty string. Wrap nullable columns as `Patch<Option<T>>` so that clearing
/// the column (`Set(None)`) is expressible too.
///
/// On the wire a missing key deserializes to `Keep` (via `#[serde(default)]`
/// on the containing field), an explicit JSON `null` to `Set(None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Keep,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// The new value if one was supplied.
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Keep => None,
            Self::Set(value) => Some(value),
        }
    }

    /// Resolve against the currently stored value.
    pub fn apply(self, current: T) -> T {
        match self {
            Self::Keep => current,
            Self::Set(value) => value,
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Self::Set(value)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Keep => serializer.serialize_none(),
            Self::Set(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpdateProjectInput;

    #[test]
    fn missing_keys_keep_every_field() {
        let input: UpdateProjectInput = serde_json::from_str("{}").unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn empty_string_is_set_not_keep() {
        let input: UpdateProjectInput =
            serde_json::from_str(r#"{"description": ""}"#).unwrap();
        assert_eq!(input.description, Patch::Set(Some(String::new())));
        assert!(input.name.is_keep());
    }

    #[test]
    fn null_clears_nullable_fields() {
        let input: UpdateProjectInput =
            serde_json::from_str(r#"{"category_id": null, "description": null}"#).unwrap();
        assert_eq!(input.category_id, Patch::Set(None));
        assert_eq!(input.description, Patch::Set(None));
    }

    #[test]
    fn null_is_rejected_for_required_fields() {
        let result = serde_json::from_str::<UpdateProjectInput>(r#"{"name": null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn keep_fields_are_omitted_when_serialized() {
        let input = UpdateProjectInput {
            name: Patch::Set("Renamed".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Renamed" }));
    }

    #[test]
    fn apply_resolves_against_current_value() {
        assert_eq!(Patch::Keep.apply(3), 3);
        assert_eq!(Patch::Set(7).apply(3), 7);
        assert_eq!(Patch::from("x").as_set(), Some(&"x"));
    }
}
