use serde::{Deserialize, Serialize};

use crate::domain::{NewTodo, Todo, TodoFields, TodoId};

pub const TODOS_ROUTE: &str = "/todos";

/// Row shape returned by `GET /todos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDocument {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: bool,
}

impl From<TodoDocument> for Todo {
    fn from(value: TodoDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            status: value.status,
        }
    }
}

impl From<Todo> for TodoDocument {
    fn from(value: Todo) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            status: value.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl From<NewTodo> for CreateTodoRequest {
    fn from(value: NewTodo) -> Self {
        Self {
            title: value.title,
            description: value.description,
        }
    }
}

impl From<CreateTodoRequest> for NewTodo {
    fn from(value: CreateTodoRequest) -> Self {
        Self {
            title: value.title,
            description: value.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoResponse {
    pub id: TodoId,
}

/// Body of `PATCH /todos/{id}`; absent fields are left untouched.
pub type UpdateTodoRequest = TodoFields;
