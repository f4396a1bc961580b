//! Store flags and their per-child overrides

use serde::{Deserialize, Serialize};

/// Behaviour flags of one store node.
///
/// `readonly` forbids write-through. `validate` runs the strategy's validate
/// step before an accepted write, or as an inspection step when readonly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreFlags {
    pub readonly: bool,
    pub validate: bool,
}

impl StoreFlags {
    pub fn new(readonly: bool, validate: bool) -> Self {
        Self { readonly, validate }
    }

    /// Writable, non-validating.
    pub fn writable() -> Self {
        Self::default()
    }

    /// Inspection mode: detect incompatible changes without persisting.
    pub fn inspect() -> Self {
        Self {
            readonly: true,
            validate: true,
        }
    }

    /// Shallow merge; set overrides win.
    pub fn merge(self, overrides: FlagOverrides) -> Self {
        Self {
            readonly: overrides.readonly.unwrap_or(self.readonly),
            validate: overrides.validate.unwrap_or(self.validate),
        }
    }
}

/// Partial flag set applied when deriving a child store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<bool>,
}

impl FlagOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = Some(readonly);
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.readonly.is_none() && self.validate.is_none()
    }
}

impl From<StoreFlags> for FlagOverrides {
    fn from(flags: StoreFlags) -> Self {
        Self {
            readonly: Some(flags.readonly),
            validate: Some(flags.validate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides_win() {
        let parent = StoreFlags::new(false, true);
        let child = parent.merge(FlagOverrides::new().readonly(true));
        assert_eq!(child, StoreFlags::new(true, true));
    }

    #[test]
    fn test_merge_empty_inherits() {
        let parent = StoreFlags::inspect();
        assert_eq!(parent.merge(FlagOverrides::new()), parent);
        assert!(FlagOverrides::new().is_empty());
    }

    #[test]
    fn test_full_override_from_flags() {
        let parent = StoreFlags::inspect();
        assert_eq!(parent.merge(StoreFlags::writable().into()), StoreFlags::writable());
    }
}
