//! Error types for SDF parsing and frame-semantics validation.

use thiserror::Error;

/// Errors that can occur while parsing an SDF document or validating its
/// frame graphs.
#[derive(Debug, Error)]
pub enum SdfError {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Missing required attribute.
    #[error("missing required attribute: {attribute} on {element}")]
    MissingAttribute {
        /// The missing attribute name.
        attribute: &'static str,
        /// The element that should have the attribute.
        element: String,
    },

    /// Two sibling entities in one scope share a name.
    #[error("duplicate name '{name}' in scope '{scope}': {first_kind} and {second_kind}")]
    DuplicateName {
        /// The colliding name.
        name: String,
        /// The scope the collision occurred in.
        scope: String,
        /// Kind of the entity that claimed the name first.
        first_kind: &'static str,
        /// Kind of the entity that collided with it.
        second_kind: &'static str,
    },

    /// An attached_to/relative_to value names a vertex that does not exist
    /// in the same scope.
    #[error("{relation} reference '{target}' from '{origin}' does not exist in scope '{scope}'")]
    DanglingReference {
        /// The relation the edge belongs to ("attached_to" or "relative_to").
        relation: &'static str,
        /// The vertex the edge starts at.
        origin: String,
        /// The name that failed to resolve.
        target: String,
        /// The scope that was searched.
        scope: String,
    },

    /// Following edges from a vertex revisits a vertex already on the path.
    #[error("{relation} cycle detected in scope '{scope}': '{origin}' leads back to '{repeated}'")]
    Cycle {
        /// The relation the cycle occurred in.
        relation: &'static str,
        /// The vertex whose outgoing edge closes the cycle.
        origin: String,
        /// The vertex that was revisited.
        repeated: String,
        /// The scope containing the cycle.
        scope: String,
    },

    /// A frame is attached to a vertex kind that can never terminate a
    /// kinematic chain.
    #[error("frame '{frame}' in scope '{scope}' is attached to {kind} '{target}', which is not a valid attachment target")]
    InvalidAttachment {
        /// The offending frame.
        frame: String,
        /// The target it names.
        target: String,
        /// The target's kind.
        kind: &'static str,
        /// The scope containing the frame.
        scope: String,
    },

    /// A pose-resolution target is not connected to the query vertex.
    #[error("pose of '{from}' cannot be resolved relative to '{to}' in scope '{scope}': target unreachable")]
    UnreachableTarget {
        /// The vertex the query started at.
        from: String,
        /// The requested target frame.
        to: String,
        /// The scope the resolution ran in.
        scope: String,
    },

    /// Pose text did not parse as six whitespace-separated numbers.
    #[error("invalid pose literal '{text}': {message}")]
    InvalidPoseLiteral {
        /// The offending text.
        text: String,
        /// Why it failed to parse.
        message: String,
    },

    /// Resolved-pose access on a scope whose frame graphs failed validation.
    #[error("frame graphs for scope '{0}' failed validation; resolved poses are unavailable")]
    GraphInvalid(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdfError {
    /// Create a missing attribute error.
    pub fn missing_attribute(attribute: &'static str, element: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute,
            element: element.into(),
        }
    }

    /// Create a duplicate name error.
    pub fn duplicate_name(
        name: impl Into<String>,
        scope: impl Into<String>,
        first_kind: &'static str,
        second_kind: &'static str,
    ) -> Self {
        Self::DuplicateName {
            name: name.into(),
            scope: scope.into(),
            first_kind,
            second_kind,
        }
    }

    /// Create a dangling reference error.
    pub fn dangling_reference(
        relation: &'static str,
        origin: impl Into<String>,
        target: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self::DanglingReference {
            relation,
            origin: origin.into(),
            target: target.into(),
            scope: scope.into(),
        }
    }

    /// Create a cycle error.
    pub fn cycle(
        relation: &'static str,
        origin: impl Into<String>,
        repeated: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self::Cycle {
            relation,
            origin: origin.into(),
            repeated: repeated.into(),
            scope: scope.into(),
        }
    }

    /// Create an invalid attachment error.
    pub fn invalid_attachment(
        frame: impl Into<String>,
        target: impl Into<String>,
        kind: &'static str,
        scope: impl Into<String>,
    ) -> Self {
        Self::InvalidAttachment {
            frame: frame.into(),
            target: target.into(),
            kind,
            scope: scope.into(),
        }
    }

    /// Create an unreachable target error.
    pub fn unreachable_target(
        from: impl Into<String>,
        to: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self::UnreachableTarget {
            from: from.into(),
            to: to.into(),
            scope: scope.into(),
        }
    }

    /// Create an invalid pose literal error.
    pub fn invalid_pose_literal(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPoseLiteral {
            text: text.into(),
            message: message.into(),
        }
    }
}

/// Result type for SDF operations.
pub type Result<T> = std::result::Result<T, SdfError>;
