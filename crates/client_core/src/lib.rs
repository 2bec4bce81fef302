//! Client side of the todo list: the collection store contract, its HTTP and
//! in-memory implementations, and the controller that keeps the visible list
//! in step with the store.

use async_trait::async_trait;
use shared::domain::{NewTodo, Todo, TodoFields, TodoId};

pub mod controller;
pub mod error;
mod http_store;
mod memory_store;

pub use controller::{
    ControllerConfig, ControllerEvent, Intent, Mutation, TodoListController, ViewState,
    DEFAULT_NOTIFICATION_TTL,
};
pub use error::{ControllerError, StoreError};
pub use http_store::HttpCollectionStore;
pub use memory_store::MemoryCollectionStore;

/// Remote document collection holding the todos.
///
/// Implementations assign ids on `create` and return documents from `list`
/// in their own stable order. `update_fields` and `delete` report
/// [`StoreError::NotFound`] for ids they do not hold.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Todo>, StoreError>;
    async fn create(&self, new_todo: NewTodo) -> Result<TodoId, StoreError>;
    async fn update_fields(&self, id: &TodoId, fields: TodoFields) -> Result<(), StoreError>;
    async fn delete(&self, id: &TodoId) -> Result<(), StoreError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
