use super::*;

async fn setup() -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext { storage }
}

#[tokio::test]
async fn created_todo_is_listed_open() {
    let ctx = setup().await;
    let created = create_todo(
        &ctx,
        NewTodo {
            title: "New".into(),
            description: "desc".into(),
        },
    )
    .await
    .expect("create");

    let todos = list_todos(&ctx).await.expect("list");
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, created.id);
    assert_eq!(todos[0].title, "New");
    assert!(!todos[0].status);
}

#[tokio::test]
async fn update_returns_merged_document() {
    let ctx = setup().await;
    let created = create_todo(
        &ctx,
        NewTodo {
            title: "Buy milk".into(),
            description: "2%".into(),
        },
    )
    .await
    .expect("create");

    let todo = update_todo(&ctx, &created.id, TodoFields::status(true))
        .await
        .expect("update");
    assert_eq!(todo.title, "Buy milk");
    assert!(todo.status);
}

#[tokio::test]
async fn missing_todo_maps_to_not_found() {
    let ctx = setup().await;
    let missing = TodoId::from("nope");

    let err = update_todo(&ctx, &missing, TodoFields::status(true))
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = delete_todo(&ctx, &missing).await.expect_err("should fail");
    assert_eq!(err.code, ErrorCode::NotFound);
}
