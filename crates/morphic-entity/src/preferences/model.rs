//! Preferences record model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use morphic_core::error::AppError;
use morphic_core::result::AppResult;
use morphic_core::traits::Record;

use super::key::PreferenceKey;
use super::value::PreferenceValue;

/// Reserved identifier of the user-less default record.
pub const DEFAULT_PREFERENCES_ID: &str = "__default__";

/// An identity-bearing mapping from setting keys to values.
///
/// Persisted as:
///
/// ```json
/// {
///   "identifier": "prefs-1",
///   "user_id": "user-7",
///   "values": { "Magnifier.magFactor": 2.5 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    identifier: String,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    values: BTreeMap<PreferenceKey, PreferenceValue>,
}

impl Preferences {
    /// Create an empty, user-less record.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            user_id: None,
            values: BTreeMap::new(),
        }
    }

    /// Create an empty record owned by `user_id`.
    pub fn for_user(identifier: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::new(identifier)
        }
    }

    /// The empty default record.
    pub fn defaults() -> Self {
        Self::new(DEFAULT_PREFERENCES_ID)
    }

    /// The identifier this record is stored under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The owning user, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Change the owning user.
    pub fn set_user_id(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    /// Whether this is the reserved default record.
    pub fn is_default(&self) -> bool {
        self.identifier == DEFAULT_PREFERENCES_ID
    }

    /// Insert or overwrite the value for `key`. Returns the previous value.
    pub fn set(
        &mut self,
        key: PreferenceKey,
        value: impl Into<PreferenceValue>,
    ) -> Option<PreferenceValue> {
        self.values.insert(key, value.into())
    }

    /// The value stored for `key`, if any.
    pub fn get(&self, key: &PreferenceKey) -> Option<&PreferenceValue> {
        self.values.get(key)
    }

    /// Remove the value for `key`. A no-op when absent.
    pub fn remove(&mut self, key: &PreferenceKey) -> Option<PreferenceValue> {
        self.values.remove(key)
    }

    /// Whether a value is stored for `key`.
    pub fn contains_key(&self, key: &PreferenceKey) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PreferenceKey, &PreferenceValue)> {
        self.values.iter()
    }

    /// Iterate over stored keys in key order.
    pub fn keys(&self) -> impl Iterator<Item = &PreferenceKey> {
        self.values.keys()
    }

    /// Encode to the JSON interchange format.
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the JSON interchange format and check invariants.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let prefs: Self = serde_json::from_str(json)?;
        prefs.validate()?;
        Ok(prefs)
    }
}

impl Record for Preferences {
    const KIND: &'static str = "preferences";

    fn identifier(&self) -> String {
        self.identifier.clone()
    }

    fn fallback(identifier: &str) -> Option<Self> {
        (identifier == DEFAULT_PREFERENCES_ID).then(Self::defaults)
    }

    fn validate(&self) -> AppResult<()> {
        if self.is_default() && self.user_id.is_some() {
            return Err(AppError::validation(format!(
                "The '{DEFAULT_PREFERENCES_ID}' record cannot be owned by a user"
            )));
        }
        if let Some((key, value)) = self.values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AppError::validation(format!(
                "Value {value} for '{key}' is not a finite number"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphic_core::error::ErrorKind;

    fn mag_factor() -> PreferenceKey {
        PreferenceKey::new("Magnifier", "magFactor")
    }

    fn inverse_video() -> PreferenceKey {
        PreferenceKey::new("Magnifier", "inverse_video")
    }

    #[test]
    fn test_set_get_remove() {
        let mut prefs = Preferences::new("prefs-1");
        assert!(prefs.get(&mag_factor()).is_none());

        assert_eq!(prefs.set(mag_factor(), 2.5), None);
        assert_eq!(
            prefs.set(mag_factor(), 3.0),
            Some(PreferenceValue::Double(2.5))
        );
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs.get(&mag_factor()), Some(&PreferenceValue::Double(3.0)));

        assert!(prefs.remove(&inverse_video()).is_none());
        assert_eq!(prefs.remove(&mag_factor()), Some(PreferenceValue::Double(3.0)));
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let mut prefs = Preferences::for_user("prefs-1", "user-7");
        prefs.set(mag_factor(), 2.5);
        prefs.set(inverse_video(), true);
        prefs.set(PreferenceKey::new("com.apple.macos.zoom", "style"), 1);
        prefs.set(PreferenceKey::new("Theme", "name"), "dark");

        let json = prefs.to_json().unwrap();
        let decoded = Preferences::from_json(&json).unwrap();
        assert_eq!(decoded, prefs);
    }

    #[test]
    fn test_wire_format() {
        let mut prefs = Preferences::for_user("prefs-1", "user-7");
        prefs.set(mag_factor(), 2.5);

        let value: serde_json::Value = serde_json::from_str(&prefs.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "identifier": "prefs-1",
                "user_id": "user-7",
                "values": { "Magnifier.magFactor": 2.5 }
            })
        );
    }

    #[test]
    fn test_decode_unknown_value_shape_fails() {
        let json = r#"{"identifier":"p","user_id":null,"values":{"A.b":[1,2]}}"#;
        let err = Preferences::from_json(json).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serialization);

        let json = r#"{"identifier":"p","values":{"nodot":true}}"#;
        assert!(Preferences::from_json(json).is_err());
    }

    #[test]
    fn test_dotted_preference_name_round_trips() {
        let mut prefs = Preferences::for_user("prefs-1", "user-7");
        prefs.set(PreferenceKey::new("Magnifier", "mag.factor"), 2.5);
        prefs.set(PreferenceKey::new("com.apple.macos.zoom", "enabled"), true);

        let back = Preferences::from_json(&prefs.to_json().unwrap()).unwrap();
        assert_eq!(back, prefs);
        assert_eq!(
            back.get(&PreferenceKey::new("Magnifier", "mag.factor")),
            Some(&PreferenceValue::Double(2.5))
        );
    }

    #[test]
    fn test_non_finite_values_are_invalid() {
        let mut prefs = Preferences::new("prefs-1");
        prefs.set(mag_factor(), f64::INFINITY);
        assert_eq!(prefs.validate().unwrap_err().kind, ErrorKind::Validation);
        assert!(prefs.to_json().is_err());

        prefs.set(mag_factor(), f64::NAN);
        assert_eq!(prefs.validate().unwrap_err().kind, ErrorKind::Validation);

        prefs.set(mag_factor(), 2.5);
        assert!(prefs.validate().is_ok());
    }

    #[test]
    fn test_decode_without_optional_fields() {
        let prefs = Preferences::from_json(r#"{"identifier":"p"}"#).unwrap();
        assert_eq!(prefs.identifier(), "p");
        assert!(prefs.user_id().is_none());
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_default_record_rules() {
        assert!(Preferences::fallback("__default__").unwrap().user_id().is_none());
        assert!(Preferences::fallback("prefs-1").is_none());

        let owned = Preferences::for_user(DEFAULT_PREFERENCES_ID, "user-7");
        assert_eq!(owned.validate().unwrap_err().kind, ErrorKind::Validation);

        let json = r#"{"identifier":"__default__","user_id":"user-7","values":{}}"#;
        assert!(Preferences::from_json(json).is_err());
    }
}
