use thiserror::Error;

use crate::model::RegistryError;

#[derive(Debug, Error)]
pub enum ReactorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("No profile selected.")]
    NoActiveProfile,
    #[error("Add at least one URL to this group.")]
    NoUrls,
    #[error("Could not detect current window size.")]
    HostUnavailable,
    #[error("No tracked windows to close for this group.")]
    NothingToClose,
    #[error("Error saving: {0}")]
    Persistence(String),
}

/// Coarse classification callers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Persistence,
    Host,
}

impl ReactorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReactorError::Registry(RegistryError::ProfileNotFound(_))
            | ReactorError::Registry(RegistryError::GroupNotFound(_)) => ErrorKind::NotFound,
            ReactorError::Registry(RegistryError::EmptyName | RegistryError::LastProfile)
            | ReactorError::NoActiveProfile
            | ReactorError::NoUrls
            | ReactorError::NothingToClose => ErrorKind::Validation,
            ReactorError::HostUnavailable => ErrorKind::Host,
            ReactorError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}
