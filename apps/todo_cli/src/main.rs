use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    CollectionStore, HttpCollectionStore, Intent, MemoryCollectionStore, TodoListController,
    ViewState,
};
use shared::domain::{FormField, NotificationKind, TodoId};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Manage the todo list held by a todo store")]
struct Args {
    /// Base URL of the todo store server.
    #[arg(long, env = "TODO_STORE_URL", default_value = "http://127.0.0.1:8443")]
    store_url: String,
    /// Use a throwaway in-process store instead of the server; overrides --store-url.
    #[arg(long)]
    memory: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every task.
    List {
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    /// Create a task.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Change the title and/or description of a task.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Flip a task between done and not done.
    Toggle { id: String },
    /// Remove a task.
    Delete { id: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let store: Arc<dyn CollectionStore> = if args.memory {
        Arc::new(MemoryCollectionStore::new())
    } else {
        Arc::new(
            HttpCollectionStore::new(&args.store_url)
                .with_context(|| format!("cannot use store url {}", args.store_url))?,
        )
    };
    let controller = TodoListController::new(store);
    controller.load().await.context("failed to load tasks")?;

    run(&controller, args.command).await?;

    let view = controller.snapshot().await;
    controller.shutdown().await;
    print!("{}", render(&view));
    Ok(())
}

async fn run(controller: &TodoListController, command: Command) -> Result<()> {
    debug!(?command, "running command");
    match command {
        Command::List { sort } => {
            // The first toggle sorts descending, the second ascending.
            let toggles = match sort {
                None => 0,
                Some(SortArg::Desc) => 1,
                Some(SortArg::Asc) => 2,
            };
            for _ in 0..toggles {
                controller.dispatch(Intent::ToggleSort).await?;
            }
        }
        Command::Add { title, description } => {
            controller.set_field(FormField::Title, title).await;
            controller.set_field(FormField::Description, description).await;
            controller.dispatch(Intent::Save).await?;
        }
        Command::Edit {
            id,
            title,
            description,
        } => {
            if title.is_none() && description.is_none() {
                bail!("edit needs --title and/or --description");
            }
            controller.dispatch(Intent::Select(TodoId::new(id))).await?;
            if !controller.snapshot().await.form.is_editing() {
                bail!("edit needs the id of an existing task");
            }
            if let Some(title) = title {
                controller.set_field(FormField::Title, title).await;
            }
            if let Some(description) = description {
                controller.set_field(FormField::Description, description).await;
            }
            controller.dispatch(Intent::Save).await?;
        }
        Command::Toggle { id } => {
            controller
                .dispatch(Intent::ToggleStatus(TodoId::new(id)))
                .await?;
        }
        Command::Delete { id } => {
            controller.dispatch(Intent::Delete(TodoId::new(id))).await?;
        }
    }
    Ok(())
}

fn render(view: &ViewState) -> String {
    let mut out = String::new();
    if view.notification.visible {
        let marker = match view.notification.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Failure => "error",
        };
        out.push_str(&format!("[{marker}] {}\n", view.notification.message));
    }
    if view.todos.is_empty() {
        out.push_str("no tasks\n");
    }
    for todo in &view.todos {
        let check = if todo.status { "x" } else { " " };
        out.push_str(&format!("[{check}] {}  {}", todo.id, todo.title));
        if !todo.description.is_empty() {
            out.push_str(&format!(" - {}", todo.description));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{Notification, Todo};

    #[test]
    fn render_marks_done_tasks_and_notification() {
        let view = ViewState {
            todos: vec![
                Todo {
                    id: TodoId::from("1"),
                    title: "Buy milk".into(),
                    description: "2%".into(),
                    status: true,
                },
                Todo {
                    id: TodoId::from("2"),
                    title: "Walk dog".into(),
                    description: String::new(),
                    status: false,
                },
            ],
            form: Default::default(),
            is_loading: false,
            notification: Notification::success("Task update successfully"),
            sort_ascending: false,
        };
        assert_eq!(
            render(&view),
            "[ok] Task update successfully\n[x] 1  Buy milk - 2%\n[ ] 2  Walk dog\n"
        );
    }

    #[tokio::test]
    async fn add_command_saves_through_controller() {
        let controller = TodoListController::new(Arc::new(MemoryCollectionStore::new()));
        run(
            &controller,
            Command::Add {
                title: "New".into(),
                description: "desc".into(),
            },
        )
        .await
        .expect("add");

        let view = controller.snapshot().await;
        assert_eq!(view.todos.len(), 1);
        assert_eq!(view.todos[0].title, "New");
        assert_eq!(view.notification.message, "Task save successfully");
    }

    #[tokio::test]
    async fn edit_without_fields_is_rejected() {
        let controller = TodoListController::new(Arc::new(MemoryCollectionStore::new()));
        let err = run(
            &controller,
            Command::Edit {
                id: "1".into(),
                title: None,
                description: None,
            },
        )
        .await
        .expect_err("should fail");
        assert!(err.to_string().contains("--title"));
    }

    #[tokio::test]
    async fn edit_with_empty_id_does_not_create() {
        let controller = TodoListController::new(Arc::new(MemoryCollectionStore::new()));
        let err = run(
            &controller,
            Command::Edit {
                id: String::new(),
                title: Some("X".into()),
                description: None,
            },
        )
        .await
        .expect_err("should fail");
        assert!(err.to_string().contains("existing task"));

        controller.load().await.expect("load");
        assert!(controller.snapshot().await.todos.is_empty());
    }

    #[tokio::test]
    async fn list_desc_needs_a_single_toggle() {
        let store = MemoryCollectionStore::new();
        for title in ["a", "c", "b"] {
            store
                .create(shared::domain::NewTodo {
                    title: title.into(),
                    description: String::new(),
                })
                .await
                .expect("seed");
        }
        let controller = TodoListController::new(Arc::new(store));
        controller.load().await.expect("load");

        run(&controller, Command::List { sort: Some(SortArg::Desc) })
            .await
            .expect("list");
        let view = controller.snapshot().await;
        let titles: Vec<_> = view.todos.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);
        assert!(!view.sort_ascending);
    }

    #[test]
    fn args_parse_memory_list_with_sort() {
        let args = Args::try_parse_from(["todo_cli", "--memory", "list", "--sort", "desc"])
            .expect("args");
        assert!(args.memory);
        assert!(matches!(
            args.command,
            Command::List {
                sort: Some(SortArg::Desc)
            }
        ));
    }
}
