use shared::{
    domain::{NewTodo, Todo, TodoFields, TodoId},
    error::{ApiError, ErrorCode},
    protocol::{CreateTodoResponse, TodoDocument},
};
use storage::Storage;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_todos(ctx: &ApiContext) -> Result<Vec<TodoDocument>, ApiError> {
    let todos = ctx.storage.list_todos().await.map_err(internal)?;
    Ok(todos
        .into_iter()
        .map(|stored| TodoDocument::from(stored.todo))
        .collect())
}

pub async fn create_todo(ctx: &ApiContext, new_todo: NewTodo) -> Result<CreateTodoResponse, ApiError> {
    let id = ctx.storage.create_todo(&new_todo).await.map_err(internal)?;
    Ok(CreateTodoResponse { id })
}

pub async fn update_todo(
    ctx: &ApiContext,
    id: &TodoId,
    fields: TodoFields,
) -> Result<Todo, ApiError> {
    let updated = ctx
        .storage
        .update_todo_fields(id, &fields)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(not_found(id));
    }

    let stored = ctx
        .storage
        .get_todo(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;
    Ok(stored.todo)
}

pub async fn delete_todo(ctx: &ApiContext, id: &TodoId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_todo(id).await.map_err(internal)?;
    if !deleted {
        return Err(not_found(id));
    }
    Ok(())
}

fn not_found(id: &TodoId) -> ApiError {
    ApiError::new(ErrorCode::NotFound, format!("todo {id} does not exist"))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
