use thiserror::Error;
use uuid::Uuid;

/// Definition-time failures raised while building an entity type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    /// The name is already bound to an incompatible attribute kind.
    #[error("attribute [{0}] declared more than once with incompatible kinds")]
    ConflictingAttribute(String),
    /// The name is bound to both an attribute and a role.
    #[error("name [{0}] is bound to both an attribute and a role")]
    ConflictingRole(String),
    #[error("attribute and role names must not be blank")]
    BlankName,
}

/// Errors raised synchronously by entity operations. No state change has
/// happened when one of these is returned.
#[derive(Debug, Error, PartialEq)]
pub enum EntityError {
    #[error("attribute [{0}] not recognised")]
    UnrecognizedAttribute(String),
    /// The attribute exists but generates no dedicated setter event; changes
    /// to it flow through the generic update path instead.
    #[error("attribute [{0}] has no dedicated setter")]
    NoSetter(String),
    #[error("value for [{attribute}] must be {expected}")]
    InvalidValue {
        attribute: String,
        expected: &'static str,
    },
    #[error("role [{0}] is not declared")]
    UnknownRole(String),
    #[error("{member} is not a member of role [{role}]")]
    NotAMember { role: String, member: Uuid },
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Fatal reconstruction failures. Replayed history that cannot be understood
/// aborts the whole reconstruction rather than skipping events.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    #[error("event kind [{type_tag}] is not registered for entity type [{entity_type}]")]
    UnknownEventKind {
        entity_type: String,
        type_tag: String,
    },
    #[error("event [{type_tag}] could not be applied: {reason}")]
    InvalidPayload { type_tag: String, reason: String },
    #[error("snapshot for entity type [{found}] replayed as [{expected}]")]
    SnapshotMismatch { expected: String, found: String },
    #[error("snapshot references undeclared attribute or role [{0}]")]
    UnknownSnapshotField(String),
}
