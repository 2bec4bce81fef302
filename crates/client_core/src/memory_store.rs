use async_trait::async_trait;
use shared::domain::{NewTodo, Todo, TodoFields, TodoId};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{CollectionStore, StoreError};

/// In-process [`CollectionStore`]; keeps documents in insertion order.
#[derive(Default)]
pub struct MemoryCollectionStore {
    todos: Mutex<Vec<Todo>>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_todos(todos: impl IntoIterator<Item = Todo>) -> Self {
        Self {
            todos: Mutex::new(todos.into_iter().collect()),
        }
    }

    #[cfg(test)]
    pub(crate) async fn get(&self, id: &TodoId) -> Option<Todo> {
        self.todos
            .lock()
            .await
            .iter()
            .find(|todo| &todo.id == id)
            .cloned()
    }
}

#[async_trait]
impl CollectionStore for MemoryCollectionStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        Ok(self.todos.lock().await.clone())
    }

    async fn create(&self, new_todo: NewTodo) -> Result<TodoId, StoreError> {
        let id = TodoId::new(Uuid::new_v4().simple().to_string());
        self.todos.lock().await.push(Todo {
            id: id.clone(),
            title: new_todo.title,
            description: new_todo.description,
            status: false,
        });
        Ok(id)
    }

    async fn update_fields(&self, id: &TodoId, fields: TodoFields) -> Result<(), StoreError> {
        let mut todos = self.todos.lock().await;
        let todo = todos
            .iter_mut()
            .find(|todo| &todo.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        fields.apply_to(todo);
        Ok(())
    }

    async fn delete(&self, id: &TodoId) -> Result<(), StoreError> {
        let mut todos = self.todos.lock().await;
        let before = todos.len();
        todos.retain(|todo| &todo.id != id);
        if todos.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}
