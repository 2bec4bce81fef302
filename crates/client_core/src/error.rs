use shared::{domain::TodoId, error::ApiException};
use thiserror::Error;

use crate::controller::Mutation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("todo {0} does not exist")]
    NotFound(TodoId),
    #[error("store rejected request: {0}")]
    Rejected(#[from] ApiException),
    #[error("store transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid store url '{0}'")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("another task operation is still in flight")]
    Busy,
    #[error("todo {0} is not in the current list")]
    UnknownTodo(TodoId),
    #[error("loading tasks failed: {0}")]
    Load(#[source] StoreError),
    #[error("{mutation} failed: {source}")]
    Mutation {
        mutation: Mutation,
        #[source]
        source: StoreError,
    },
}

impl ControllerError {
    #[cfg(test)]
    pub(crate) fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Load(source) | Self::Mutation { source, .. } => Some(source),
            Self::Busy | Self::UnknownTodo(_) => None,
        }
    }
}
