use crate::{Component, IntentionSpec};
use std::fmt;
use thiserror::Error;

/// The maximum length, in bytes, of a description or of a metadata value.
pub const DESCRIPTION_MAX_LEN: usize = 512;

const META_MAX_PAIRS: usize = 64;
const META_KEY_MAX_LEN: usize = 128;
const META_VALUE_MAX_LEN: usize = DESCRIPTION_MAX_LEN;

/// Names a validated field of an [`IntentionSpec`], using its wire name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    SourceNamespace,
    SourceName,
    DestinationNamespace,
    DestinationName,
}

/// Describes why an intention cannot be accepted.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be set")]
    Missing(Field),

    #[error("{0}: wildcard character '*' cannot be used with partial values")]
    PartialWildcard(Field),

    #[error("{0}: exact value cannot follow wildcard namespace")]
    ExactAfterWildcard(Field),

    #[error("Description exceeds maximum length {max}", max = DESCRIPTION_MAX_LEN)]
    DescriptionTooLong,

    #[error("Meta exceeds maximum element count {max}", max = META_MAX_PAIRS)]
    TooManyMeta,

    #[error("Meta key {0:?} exceeds maximum length {max}", max = META_KEY_MAX_LEN)]
    MetaKeyTooLong(String),

    #[error("Meta value for key {0:?} exceeds maximum length {max}", max = META_VALUE_MAX_LEN)]
    MetaValueTooLong(String),

    #[error("Action must be set to 'allow' or 'deny'")]
    InvalidAction,

    #[error("SourceType must be set to 'consul'")]
    InvalidSourceType,
}

// === impl Field ===

impl Field {
    fn value(self, spec: &IntentionSpec) -> &str {
        match self {
            Self::SourceNamespace => &spec.source_ns,
            Self::SourceName => &spec.source_name,
            Self::DestinationNamespace => &spec.destination_ns,
            Self::DestinationName => &spec.destination_name,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceNamespace => "SourceNS".fmt(f),
            Self::SourceName => "SourceName".fmt(f),
            Self::DestinationNamespace => "DestinationNS".fmt(f),
            Self::DestinationName => "DestinationName".fmt(f),
        }
    }
}

// === impl IntentionSpec ===

impl IntentionSpec {
    /// Checks that the spec is structurally valid, returning the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.validation_errors().into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Returns every structural problem with the spec.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let fields = [
            Field::SourceNamespace,
            Field::SourceName,
            Field::DestinationNamespace,
            Field::DestinationName,
        ];
        for field in fields {
            if field.value(self).is_empty() {
                errors.push(ValidationError::Missing(field));
            }
        }

        for (ns, name) in [
            (Field::SourceNamespace, Field::SourceName),
            (Field::DestinationNamespace, Field::DestinationName),
        ] {
            if Component::is_partial_wildcard(ns.value(self)) {
                errors.push(ValidationError::PartialWildcard(ns));
            }

            let name_value = name.value(self);
            if Component::is_partial_wildcard(name_value) {
                errors.push(ValidationError::PartialWildcard(name));
            }

            // A wildcard namespace cannot be narrowed by an exact name. An empty name is already
            // reported as missing.
            let ns_wildcard = Component::new(ns.value(self)).is_wildcard();
            let exact_name = !name_value.is_empty() && !Component::new(name_value).is_wildcard();
            if ns_wildcard && exact_name {
                errors.push(ValidationError::ExactAfterWildcard(name));
            }
        }

        if self.description.len() > DESCRIPTION_MAX_LEN {
            errors.push(ValidationError::DescriptionTooLong);
        }

        if self.meta.len() > META_MAX_PAIRS {
            errors.push(ValidationError::TooManyMeta);
        }
        for (k, v) in &self.meta {
            if k.len() > META_KEY_MAX_LEN {
                errors.push(ValidationError::MetaKeyTooLong(k.clone()));
            }
            if v.len() > META_VALUE_MAX_LEN {
                errors.push(ValidationError::MetaValueTooLong(k.clone()));
            }
        }

        if self.parsed_action().is_none() {
            errors.push(ValidationError::InvalidAction);
        }

        if self.parsed_source_type().is_none() {
            errors.push(ValidationError::InvalidSourceType);
        }

        errors
    }
}
