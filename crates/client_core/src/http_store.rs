use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{NewTodo, Todo, TodoFields, TodoId},
    error::{ApiError, ApiException, ErrorCode},
    protocol::{CreateTodoRequest, CreateTodoResponse, TodoDocument, TODOS_ROUTE},
};
use tracing::debug;
use url::Url;

use crate::{CollectionStore, StoreError};

/// [`CollectionStore`] backed by the todo server's `/todos` routes.
pub struct HttpCollectionStore {
    http: Client,
    base_url: Url,
}

impl HttpCollectionStore {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, StoreError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| StoreError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(base_url.to_string()));
        }
        // Url::join drops the last segment unless the path ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn todos_url(&self) -> Result<Url, StoreError> {
        self.base_url
            .join(TODOS_ROUTE.trim_start_matches('/'))
            .map_err(|e| StoreError::InvalidUrl(e.to_string()))
    }

    pub(crate) fn todo_url(&self, id: &TodoId) -> Result<Url, StoreError> {
        let mut url = self.todos_url()?;
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl(self.base_url.to_string()))?
            .push(id.as_str());
        Ok(url)
    }
}

async fn ensure_success(response: Response, id: Option<&TodoId>) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(StoreError::NotFound(id.clone()));
        }
    }

    let exception = match response.json::<ApiError>().await {
        Ok(body) => ApiException::from(body),
        Err(_) => ApiException::new(ErrorCode::Internal, format!("store responded with {status}")),
    };
    Err(StoreError::Rejected(exception))
}

#[async_trait]
impl CollectionStore for HttpCollectionStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let response = self.http.get(self.todos_url()?).send().await?;
        let documents: Vec<TodoDocument> = ensure_success(response, None).await?.json().await?;
        debug!(count = documents.len(), "fetched todo documents");
        Ok(documents.into_iter().map(Todo::from).collect())
    }

    async fn create(&self, new_todo: NewTodo) -> Result<TodoId, StoreError> {
        let response = self
            .http
            .post(self.todos_url()?)
            .json(&CreateTodoRequest::from(new_todo))
            .send()
            .await?;
        let body: CreateTodoResponse = ensure_success(response, None).await?.json().await?;
        Ok(body.id)
    }

    async fn update_fields(&self, id: &TodoId, fields: TodoFields) -> Result<(), StoreError> {
        let response = self
            .http
            .patch(self.todo_url(id)?)
            .json(&fields)
            .send()
            .await?;
        ensure_success(response, Some(id)).await?;
        Ok(())
    }

    async fn delete(&self, id: &TodoId) -> Result<(), StoreError> {
        let response = self.http.delete(self.todo_url(id)?).send().await?;
        ensure_success(response, Some(id)).await?;
        Ok(())
    }
}
