//! Error taxonomy for the mapping compiler and executor.
//!
//! Modeled on `oxide-migrate`'s hand-enumerated `thiserror` error type: one
//! variant per failure family named in the spec (`MappingError`,
//! `TransformError`, `ValidationError`, `WriterError`), each carrying enough
//! context (offending target name / DSL substring) to act on without a
//! debugger.

use thiserror::Error;

/// A failure raised by the compiler or executor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Structural problems in the mapping document itself.
    #[error("mapping error: {reason}{}", target_suffix(target))]
    Mapping {
        reason: String,
        target: Option<String>,
    },

    /// DSL parse failure, unknown OP/METHOD, wrong arity, evaluation failure.
    #[error("transform error: {reason}{}{}", target_suffix(target), substring_suffix(substring))]
    Transform {
        reason: String,
        target: Option<String>,
        substring: Option<String>,
    },

    /// Domain-rule failures layered on top of the core. The core itself
    /// defines none, but the type exists so collaborators can raise them
    /// through the same `Result` alias.
    #[error("validation error: {reason}")]
    Validation { reason: String },

    /// Output-writer failures (format/IO), reused by `mapping-io` so callers
    /// only ever match one error type end to end.
    #[error("writer error: {reason}")]
    Writer { reason: String },
}

fn target_suffix(target: &Option<String>) -> String {
    match target {
        Some(t) => format!(" (target: {t})"),
        None => String::new(),
    }
}

fn substring_suffix(substring: &Option<String>) -> String {
    match substring {
        Some(s) => format!(" (at: {s})"),
        None => String::new(),
    }
}

impl Error {
    pub fn mapping(reason: impl Into<String>) -> Self {
        Error::Mapping {
            reason: reason.into(),
            target: None,
        }
    }

    pub fn mapping_for(reason: impl Into<String>, target: impl Into<String>) -> Self {
        Error::Mapping {
            reason: reason.into(),
            target: Some(target.into()),
        }
    }

    pub fn transform(reason: impl Into<String>) -> Self {
        Error::Transform {
            reason: reason.into(),
            target: None,
            substring: None,
        }
    }

    pub fn transform_at(reason: impl Into<String>, substring: impl Into<String>) -> Self {
        Error::Transform {
            reason: reason.into(),
            target: None,
            substring: Some(substring.into()),
        }
    }

    pub fn transform_for(
        reason: impl Into<String>,
        target: impl Into<String>,
        substring: impl Into<String>,
    ) -> Self {
        Error::Transform {
            reason: reason.into(),
            target: Some(target.into()),
            substring: Some(substring.into()),
        }
    }

    pub fn writer(reason: impl Into<String>) -> Self {
        Error::Writer {
            reason: reason.into(),
        }
    }

    /// Attaches a target name to an existing error, if the variant supports it
    /// and doesn't already carry one.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        match &mut self {
            Error::Mapping { target: t, .. } | Error::Transform { target: t, .. } => {
                if t.is_none() {
                    *t = Some(target.into());
                }
            }
            Error::Validation { .. } | Error::Writer { .. } => {}
        }
        self
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_error_includes_target() {
        let e = Error::mapping_for("source column missing", "country");
        assert_eq!(
            e.to_string(),
            "mapping error: source column missing (target: country)"
        );
    }

    #[test]
    fn transform_error_includes_substring_and_target() {
        let e = Error::transform_for("unknown OP", "full_name", "FOO[BAR(1)]");
        assert_eq!(
            e.to_string(),
            "transform error: unknown OP (target: full_name) (at: FOO[BAR(1)])"
        );
    }

    #[test]
    fn with_target_does_not_override_existing() {
        let e = Error::mapping_for("bad thing", "a").with_target("b");
        assert_eq!(e, Error::mapping_for("bad thing", "a"));
    }
}
