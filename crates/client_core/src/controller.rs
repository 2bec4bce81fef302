//! Todo list controller: owns the visible list, the edit form, the busy flag
//! and the transient notification, and turns user intents into store calls.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use shared::domain::{FormField, FormState, NewTodo, Notification, Todo, TodoFields, TodoId};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{CollectionStore, ControllerError, StoreError};

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(3000);
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long a notification stays visible before it hides itself.
    pub notification_ttl: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
        }
    }
}

/// The store-writing operations. Each one is followed by a reload and a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Save,
    UpdateStatus,
    Delete,
}

impl Mutation {
    pub fn success_message(self) -> &'static str {
        match self {
            Self::Save => "Task save successfully",
            Self::UpdateStatus => "Task update successfully",
            Self::Delete => "Task delete successfully",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Save => "Task save failed",
            Self::UpdateStatus => "Task update failed",
            Self::Delete => "Task delete failed",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Save => "save",
            Self::UpdateStatus => "status update",
            Self::Delete => "delete",
        })
    }
}

/// Action events forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Load,
    Save,
    Select(TodoId),
    Deselect,
    ToggleStatus(TodoId),
    Delete(TodoId),
    ToggleSort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    StateChanged,
    NotificationShown(Notification),
    NotificationCleared,
}

/// Everything the presentation layer needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub todos: Vec<Todo>,
    pub form: FormState,
    pub is_loading: bool,
    pub notification: Notification,
    pub sort_ascending: bool,
}

struct ControllerState {
    todos: Vec<Todo>,
    form: FormState,
    is_loading: bool,
    notification: Notification,
    sort_ascending: bool,
    sort_active: bool,
    notification_generation: u64,
    notification_task: Option<JoinHandle<()>>,
}

impl Default for ControllerState {
    fn default() -> Self {
        // The flag names the current direction, so the first toggle lands on descending.
        Self {
            todos: Vec::new(),
            form: FormState::default(),
            is_loading: false,
            notification: Notification::default(),
            sort_ascending: true,
            sort_active: false,
            notification_generation: 0,
            notification_task: None,
        }
    }
}

impl ControllerState {
    fn replace_todos(&mut self, mut todos: Vec<Todo>) {
        if self.sort_active {
            sort_by_title(&mut todos, self.sort_ascending);
        }
        self.todos = todos;
    }
}

pub struct TodoListController {
    store: Arc<dyn CollectionStore>,
    config: ControllerConfig,
    state: Arc<Mutex<ControllerState>>,
    // Held for the whole of a load or mutation; never awaited, only try-locked.
    busy: Mutex<()>,
    events: broadcast::Sender<ControllerEvent>,
}

impl TodoListController {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self::with_config(store, ControllerConfig::default())
    }

    pub fn with_config(store: Arc<dyn CollectionStore>, config: ControllerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            config,
            state: Arc::new(Mutex::new(ControllerState::default())),
            busy: Mutex::new(()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ViewState {
        let state = self.state.lock().await;
        ViewState {
            todos: state.todos.clone(),
            form: state.form.clone(),
            is_loading: state.is_loading,
            notification: state.notification.clone(),
            sort_ascending: state.sort_ascending,
        }
    }

    /// Fetches every document and replaces the local list with it.
    pub async fn load(&self) -> Result<(), ControllerError> {
        let _busy = self.busy.try_lock().map_err(|_| ControllerError::Busy)?;
        self.set_loading(true).await;
        let result = self.refresh().await;
        self.set_loading(false).await;
        result.map_err(|error| {
            warn!(%error, "loading tasks failed");
            ControllerError::Load(error)
        })
    }

    /// Submits the current form, creating or updating depending on its id.
    pub async fn save(&self) -> Result<(), ControllerError> {
        let form = self.state.lock().await.form.clone();
        self.save_form(form).await
    }

    pub async fn save_form(&self, form: FormState) -> Result<(), ControllerError> {
        let store = Arc::clone(&self.store);
        self.run_mutation(Mutation::Save, async move {
            if form.id.is_empty() {
                let id = store
                    .create(NewTodo {
                        title: form.title,
                        description: form.description,
                    })
                    .await?;
                debug!(%id, "todo created");
            } else {
                store
                    .update_fields(&form.id, TodoFields::text(form.title, form.description))
                    .await?;
                debug!(id = %form.id, "todo text updated");
            }
            Ok(())
        })
        .await
    }

    pub async fn toggle_status(
        &self,
        id: &TodoId,
        current_status: bool,
    ) -> Result<(), ControllerError> {
        let store = Arc::clone(&self.store);
        let id = id.clone();
        self.run_mutation(Mutation::UpdateStatus, async move {
            store
                .update_fields(&id, TodoFields::status(!current_status))
                .await
        })
        .await
    }

    pub async fn delete(&self, id: &TodoId) -> Result<(), ControllerError> {
        let store = Arc::clone(&self.store);
        let id = id.clone();
        self.run_mutation(Mutation::Delete, async move { store.delete(&id).await })
            .await
    }

    /// Loads `data` into the form for editing. Returns false, leaving the form
    /// alone, when `id` is empty.
    pub async fn select(&self, id: &TodoId, data: &Todo) -> bool {
        if id.is_empty() {
            return false;
        }
        {
            let mut state = self.state.lock().await;
            state.form = FormState {
                id: id.clone(),
                title: data.title.clone(),
                description: data.description.clone(),
                status: data.status,
            };
        }
        self.emit(ControllerEvent::StateChanged);
        true
    }

    pub async fn deselect(&self) {
        self.state.lock().await.form = FormState::default();
        self.emit(ControllerEvent::StateChanged);
    }

    pub async fn set_field(&self, field: FormField, value: impl Into<String>) {
        self.state.lock().await.form.set(field, value);
        self.emit(ControllerEvent::StateChanged);
    }

    /// Flips the sort direction and reorders the in-memory list by title.
    pub async fn toggle_sort(&self) {
        {
            let mut state = self.state.lock().await;
            state.sort_ascending = !state.sort_ascending;
            state.sort_active = true;
            let ascending = state.sort_ascending;
            sort_by_title(&mut state.todos, ascending);
            debug!(ascending, "sorted todo list");
        }
        self.emit(ControllerEvent::StateChanged);
    }

    pub async fn dispatch(&self, intent: Intent) -> Result<(), ControllerError> {
        match intent {
            Intent::Load => self.load().await,
            Intent::Save => self.save().await,
            Intent::Select(id) => {
                if id.is_empty() {
                    return Ok(());
                }
                let todo = self.find(&id).await?;
                self.select(&id, &todo).await;
                Ok(())
            }
            Intent::Deselect => {
                self.deselect().await;
                Ok(())
            }
            Intent::ToggleStatus(id) => {
                let todo = self.find(&id).await?;
                self.toggle_status(&id, todo.status).await
            }
            Intent::Delete(id) => self.delete(&id).await,
            Intent::ToggleSort => {
                self.toggle_sort().await;
                Ok(())
            }
        }
    }

    /// Cancels the pending notification timer.
    pub async fn shutdown(&self) {
        if let Some(task) = self.state.lock().await.notification_task.take() {
            task.abort();
        }
    }

    async fn find(&self, id: &TodoId) -> Result<Todo, ControllerError> {
        self.state
            .lock()
            .await
            .todos
            .iter()
            .find(|todo| &todo.id == id)
            .cloned()
            .ok_or_else(|| ControllerError::UnknownTodo(id.clone()))
    }

    async fn run_mutation<F>(&self, mutation: Mutation, write: F) -> Result<(), ControllerError>
    where
        F: Future<Output = Result<(), StoreError>>,
    {
        let _busy = self.busy.try_lock().map_err(|_| {
            debug!(%mutation, "rejected while another operation is in flight");
            ControllerError::Busy
        })?;
        self.set_loading(true).await;

        let result = async {
            write.await?;
            if mutation == Mutation::Save {
                self.state.lock().await.form = FormState::default();
            }
            self.refresh().await
        }
        .await;

        let mut state = self.state.lock().await;
        state.is_loading = false;
        match result {
            Ok(()) => {
                info!(%mutation, "task mutation completed");
                self.show_notification(&mut state, Notification::success(mutation.success_message()));
                drop(state);
                self.emit(ControllerEvent::StateChanged);
                Ok(())
            }
            Err(error) => {
                warn!(%mutation, %error, "task mutation failed");
                self.show_notification(&mut state, Notification::failure(mutation.failure_message()));
                drop(state);
                self.emit(ControllerEvent::StateChanged);
                Err(ControllerError::Mutation {
                    mutation,
                    source: error,
                })
            }
        }
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        let todos = self.store.list().await?;
        debug!(count = todos.len(), "reloaded todo list");
        self.state.lock().await.replace_todos(todos);
        self.emit(ControllerEvent::StateChanged);
        Ok(())
    }

    async fn set_loading(&self, is_loading: bool) {
        self.state.lock().await.is_loading = is_loading;
        self.emit(ControllerEvent::StateChanged);
    }

    /// Shows `notification` and schedules its hide. Any earlier timer is
    /// aborted, and the generation check keeps a timer that already woke up
    /// from hiding a newer message.
    fn show_notification(&self, state: &mut ControllerState, notification: Notification) {
        if let Some(task) = state.notification_task.take() {
            task.abort();
        }
        state.notification_generation += 1;
        let generation = state.notification_generation;
        state.notification = notification.clone();
        self.emit(ControllerEvent::NotificationShown(notification));

        let shared = Arc::clone(&self.state);
        let events = self.events.clone();
        let ttl = self.config.notification_ttl;
        state.notification_task = Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut state = shared.lock().await;
            if state.notification_generation != generation {
                return;
            }
            state.notification = Notification::default();
            state.notification_task = None;
            drop(state);
            let _ = events.send(ControllerEvent::NotificationCleared);
        }));
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine; the view can always poll `snapshot`.
        let _ = self.events.send(event);
    }
}

impl Drop for TodoListController {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_lock() {
            if let Some(task) = state.notification_task.take() {
                task.abort();
            }
        }
    }
}

fn sort_by_title(todos: &mut [Todo], ascending: bool) {
    if ascending {
        todos.sort_by(|a, b| a.title.cmp(&b.title));
    } else {
        todos.sort_by(|a, b| b.title.cmp(&a.title));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
