//! Typed, flagged field storage for constructs.
//!
//! Every construct field starts out `Pure | Unset`. An ordinary assignment
//! clears both flags; unassignment restores the default and re-sets `Unset`;
//! protection is one-way for the lifetime of the construct. Dubious
//! assignment (`?=`) only lands on fields that are still unset and not
//! protected, which is what lets schema templates supply fallback defaults
//! without ever clobbering an explicit user value.

use std::str::FromStr;

use thiserror::Error;

use crate::engine::types::InvalidEnumValue;

/// Typed failure of a field mutation. The construct layer maps these onto
/// engine errors; `FieldProtected` and `FieldNotUnset` are benign outcomes
/// for dubious assignment rather than hard errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("no such field as '{field}' exists in this scope")]
    FieldDoesNotExist { field: String },

    #[error("field '{field}' expects a {expected} value, but a {got} was given")]
    InvalidType {
        field: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("field '{field}' cannot hold '{value}'; allowed values: {allowed:?}")]
    InvalidData {
        field: String,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("operation is only valid on array fields, and '{field}' is not one")]
    InvalidOperation { field: String },

    #[error("field '{field}' is protected against dubious assignment")]
    FieldProtected { field: String },

    #[error("field '{field}' was already assigned; dubious assignment skipped")]
    FieldNotUnset { field: String },
}

const PURE: u8 = 1 << 0;
const UNSET: u8 = 1 << 1;
const PROTECTED: u8 = 1 << 2;

/// Bitset of field state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFlags(u8);

impl FieldFlags {
    /// The state of a freshly constructed field.
    pub fn pristine() -> Self {
        FieldFlags(PURE | UNSET)
    }

    pub fn is_pure(&self) -> bool {
        self.0 & PURE != 0
    }

    pub fn is_unset(&self) -> bool {
        self.0 & UNSET != 0
    }

    pub fn is_protected(&self) -> bool {
        self.0 & PROTECTED != 0
    }

    fn mark_assigned(&mut self) {
        self.0 &= !(PURE | UNSET);
    }

    fn mark_unset(&mut self) {
        self.0 |= UNSET;
    }

    fn mark_protected(&mut self) {
        self.0 |= PROTECTED;
    }
}

/// A resolved right-hand-side value being written into a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldValueRef<'a> {
    String(&'a str),
    Array(&'a [String]),
}

impl FieldValueRef<'_> {
    fn kind_name(&self) -> &'static str {
        match self {
            FieldValueRef::String(_) => "string",
            FieldValueRef::Array(_) => "array",
        }
    }
}

#[derive(Debug, Clone)]
enum FieldKind {
    String {
        default: String,
        value: String,
    },
    Constraint {
        default: String,
        value: String,
        allowed: &'static [&'static str],
    },
    Array {
        default: Vec<String>,
        value: Vec<String>,
    },
}

/// Canonical string values of a boolean field.
pub const BOOLEAN_VALUES: &[&str] = &["Yes", "No"];

/// One named, flagged field of a construct.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    flags: FieldFlags,
    kind: FieldKind,
}

impl Field {
    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        let default = default.into();
        Field {
            name: name.into(),
            flags: FieldFlags::pristine(),
            kind: FieldKind::String {
                value: default.clone(),
                default,
            },
        }
    }

    pub fn constraint(
        name: impl Into<String>,
        default: impl Into<String>,
        allowed: &'static [&'static str],
    ) -> Self {
        let default = default.into();
        debug_assert!(allowed.contains(&default.as_str()));
        Field {
            name: name.into(),
            flags: FieldFlags::pristine(),
            kind: FieldKind::Constraint {
                value: default.clone(),
                default,
                allowed,
            },
        }
    }

    /// A constraint field over `{Yes, No}`.
    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Field::constraint(name, if default { "Yes" } else { "No" }, BOOLEAN_VALUES)
    }

    pub fn array(name: impl Into<String>, default: Vec<String>) -> Self {
        Field {
            name: name.into(),
            flags: FieldFlags::pristine(),
            kind: FieldKind::Array {
                value: default.clone(),
                default,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn assign(&mut self, incoming: FieldValueRef<'_>) -> Result<(), FieldError> {
        self.validate_and_store(incoming)?;
        self.flags.mark_assigned();
        Ok(())
    }

    /// Dubious assignment: first writer wins, but a field the user has
    /// already assigned or protected is left alone.
    pub fn dubious_assign(&mut self, incoming: FieldValueRef<'_>) -> Result<(), FieldError> {
        if self.flags.is_protected() {
            return Err(FieldError::FieldProtected {
                field: self.name.clone(),
            });
        }
        if !self.flags.is_unset() {
            return Err(FieldError::FieldNotUnset {
                field: self.name.clone(),
            });
        }
        self.assign(incoming)
    }

    pub fn append(&mut self, incoming: FieldValueRef<'_>) -> Result<(), FieldError> {
        let FieldKind::Array { value, .. } = &mut self.kind else {
            return Err(FieldError::InvalidOperation {
                field: self.name.clone(),
            });
        };
        match incoming {
            FieldValueRef::String(s) => value.push(s.to_string()),
            FieldValueRef::Array(items) => value.extend(items.iter().cloned()),
        }
        self.flags.mark_assigned();
        Ok(())
    }

    pub fn erase(&mut self, incoming: FieldValueRef<'_>) -> Result<(), FieldError> {
        let FieldKind::Array { value, .. } = &mut self.kind else {
            return Err(FieldError::InvalidOperation {
                field: self.name.clone(),
            });
        };
        match incoming {
            FieldValueRef::String(s) => value.retain(|v| v != s),
            FieldValueRef::Array(items) => value.retain(|v| !items.contains(v)),
        }
        self.flags.mark_assigned();
        Ok(())
    }

    /// Restore the default value and mark the field unset again. Idempotent.
    pub fn unassign(&mut self) {
        match &mut self.kind {
            FieldKind::String { default, value } => *value = default.clone(),
            FieldKind::Constraint { default, value, .. } => *value = default.clone(),
            FieldKind::Array { default, value } => *value = default.clone(),
        }
        self.flags.mark_unset();
    }

    /// One-way: a protected field stays protected for the construct's life.
    pub fn protect(&mut self) {
        self.flags.mark_protected();
    }

    pub fn as_str(&self) -> Result<&str, FieldError> {
        match &self.kind {
            FieldKind::String { value, .. } | FieldKind::Constraint { value, .. } => Ok(value),
            FieldKind::Array { .. } => Err(FieldError::InvalidType {
                field: self.name.clone(),
                expected: "string",
                got: "array",
            }),
        }
    }

    pub fn as_array(&self) -> Result<&[String], FieldError> {
        match &self.kind {
            FieldKind::Array { value, .. } => Ok(value),
            _ => Err(FieldError::InvalidType {
                field: self.name.clone(),
                expected: "array",
                got: "string",
            }),
        }
    }

    /// Typed conversion of a constraint field's value.
    pub fn as_enum<T>(&self) -> Result<T, FieldError>
    where
        T: FromStr<Err = InvalidEnumValue>,
    {
        let value = self.as_str()?;
        value.parse().map_err(|e: InvalidEnumValue| FieldError::InvalidData {
            field: self.name.clone(),
            value: e.value,
            allowed: e.allowed,
        })
    }

    /// Boolean conversion of a `{Yes, No}` constraint field.
    pub fn as_bool(&self) -> Result<bool, FieldError> {
        Ok(self.as_str()? == "Yes")
    }

    fn validate_and_store(&mut self, incoming: FieldValueRef<'_>) -> Result<(), FieldError> {
        match (&mut self.kind, incoming) {
            (FieldKind::String { value, .. }, FieldValueRef::String(s)) => {
                *value = s.to_string();
                Ok(())
            }
            (
                FieldKind::Constraint { value, allowed, .. },
                FieldValueRef::String(s),
            ) => {
                if !allowed.contains(&s) {
                    return Err(FieldError::InvalidData {
                        field: self.name.clone(),
                        value: s.to_string(),
                        allowed,
                    });
                }
                *value = s.to_string();
                Ok(())
            }
            (FieldKind::Array { value, .. }, FieldValueRef::Array(items)) => {
                *value = items.to_vec();
                Ok(())
            }
            (FieldKind::Array { .. }, other) => Err(FieldError::InvalidType {
                field: self.name.clone(),
                expected: "array",
                got: other.kind_name(),
            }),
            (_, other) => Err(FieldError::InvalidType {
                field: self.name.clone(),
                expected: "string",
                got: other.kind_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::Optimization;

    #[test]
    fn test_field_starts_pristine() {
        let field = Field::string("OutputName", "App");
        assert!(field.flags().is_pure());
        assert!(field.flags().is_unset());
        assert!(!field.flags().is_protected());
        assert_eq!(field.as_str().unwrap(), "App");
    }

    #[test]
    fn test_assign_clears_pure_and_unset() {
        let mut field = Field::string("OutputName", "App");
        field.assign(FieldValueRef::String("Game")).unwrap();
        assert!(!field.flags().is_pure());
        assert!(!field.flags().is_unset());
        assert_eq!(field.as_str().unwrap(), "Game");
    }

    #[test]
    fn test_unassign_restores_default_and_is_idempotent() {
        let mut field = Field::string("OutputName", "App");
        field.assign(FieldValueRef::String("Game")).unwrap();
        field.unassign();
        assert_eq!(field.as_str().unwrap(), "App");
        assert!(field.flags().is_unset());
        field.unassign();
        assert!(field.flags().is_unset());
    }

    #[test]
    fn test_assign_type_mismatch() {
        let mut field = Field::string("OutputName", "");
        let items = vec!["a".to_string()];
        assert!(matches!(
            field.assign(FieldValueRef::Array(&items)),
            Err(FieldError::InvalidType { .. })
        ));

        let mut array = Field::array("Definitions", vec![]);
        assert!(matches!(
            array.assign(FieldValueRef::String("X")),
            Err(FieldError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_constraint_rejects_out_of_set_value() {
        let mut field = Field::constraint("Optimization", "Off", Optimization::NAMES);
        assert!(matches!(
            field.assign(FieldValueRef::String("Ludicrous")),
            Err(FieldError::InvalidData { .. })
        ));
        // Value unchanged on failure.
        assert_eq!(field.as_str().unwrap(), "Off");

        field.assign(FieldValueRef::String("Fastest")).unwrap();
        assert_eq!(field.as_enum::<Optimization>().unwrap(), Optimization::Fastest);
    }

    #[test]
    fn test_boolean_conversion() {
        let mut field = Field::boolean("bDebugSymbols", false);
        assert!(!field.as_bool().unwrap());
        field.assign(FieldValueRef::String("Yes")).unwrap();
        assert!(field.as_bool().unwrap());
        assert!(matches!(
            field.assign(FieldValueRef::String("Maybe")),
            Err(FieldError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_append_and_erase_on_array() {
        let mut field = Field::array("Definitions", vec!["KEEP".to_string()]);
        field.append(FieldValueRef::String("A")).unwrap();
        let many = vec!["B".to_string(), "C".to_string()];
        field.append(FieldValueRef::Array(&many)).unwrap();
        assert_eq!(field.as_array().unwrap(), ["KEEP", "A", "B", "C"]);

        field.erase(FieldValueRef::String("B")).unwrap();
        let gone = vec!["KEEP".to_string(), "C".to_string()];
        field.erase(FieldValueRef::Array(&gone)).unwrap();
        assert_eq!(field.as_array().unwrap(), ["A"]);
    }

    #[test]
    fn test_append_on_non_array_is_invalid_operation() {
        let mut field = Field::string("OutputName", "");
        assert!(matches!(
            field.append(FieldValueRef::String("x")),
            Err(FieldError::InvalidOperation { .. })
        ));
        assert!(matches!(
            field.erase(FieldValueRef::String("x")),
            Err(FieldError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_dubious_assign_first_writer_wins() {
        let mut field = Field::string("OutputPath", "Binaries");
        field.dubious_assign(FieldValueRef::String("Out")).unwrap();
        assert_eq!(field.as_str().unwrap(), "Out");

        // Second dubious write loses.
        assert!(matches!(
            field.dubious_assign(FieldValueRef::String("Other")),
            Err(FieldError::FieldNotUnset { .. })
        ));
        assert_eq!(field.as_str().unwrap(), "Out");
    }

    #[test]
    fn test_dubious_assign_respects_protection() {
        let mut field = Field::string("OutputPath", "Binaries");
        field.protect();
        assert!(matches!(
            field.dubious_assign(FieldValueRef::String("Out")),
            Err(FieldError::FieldProtected { .. })
        ));
        assert_eq!(field.as_str().unwrap(), "Binaries");
        // Protection does not block ordinary assignment.
        field.assign(FieldValueRef::String("Explicit")).unwrap();
        assert_eq!(field.as_str().unwrap(), "Explicit");
    }

    #[test]
    fn test_explicit_assign_beats_later_dubious() {
        let mut field = Field::string("OutputName", "Default");
        field.assign(FieldValueRef::String("UserChoice")).unwrap();
        assert!(matches!(
            field.dubious_assign(FieldValueRef::String("TemplateFallback")),
            Err(FieldError::FieldNotUnset { .. })
        ));
        assert_eq!(field.as_str().unwrap(), "UserChoice");
    }
}
