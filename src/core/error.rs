use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("{}", describe_out_of_bounds(.index, .bound))]
    IndexOutOfBounds { index: isize, bound: usize },

    #[error("Cannot {0} outside of a write transaction")]
    NotInTransaction(String),

    #[error("The store is already in a write transaction")]
    AlreadyInTransaction,

    #[error("{0}")]
    Invalidated(String),

    #[error("This class is not key value coding-compliant for the key '{0}'")]
    UnknownKey(String),

    #[error("{0}")]
    MutuallyExclusiveConfiguration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Cannot write to a read-only store: {0}")]
    ReadOnly(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Property '{property}' not found on object type '{object_type}'")]
    PropertyNotFound { object_type: String, property: String },

    #[error("Object type '{0}' is not part of the store schema")]
    ObjectTypeNotInSchema(String),

    #[error("Object is unmanaged or belongs to a different store")]
    ForeignObject,

    #[error("Migration is required: {0}")]
    MigrationRequired(String),

    #[error("Schema version mismatch: {0}")]
    SchemaVersionMismatch(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

fn describe_out_of_bounds(index: &isize, bound: &usize) -> String {
    if *index < 0 {
        format!("Cannot pass a negative value ({index}) as an index; valid range is [0, {bound})")
    } else {
        format!("Index {index} is out of bounds (must be less than {bound})")
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_messages() {
        let err = DbError::IndexOutOfBounds { index: 3, bound: 3 };
        assert_eq!(err.to_string(), "Index 3 is out of bounds (must be less than 3)");

        let err = DbError::IndexOutOfBounds { index: -1, bound: 0 };
        assert!(err.to_string().contains("negative value"));
    }
}
