//! The public Geocore client.
//!
//! # Design
//! `GeocoreClient` is a cheap handle (`Arc` inside) over one session and one
//! transport. Every operation exists as an async method; the callback
//! variants wrap those same futures with `callback::spawn_with_callback`, so
//! they cannot drift apart.
//!
//! Resource paths are passed through verbatim and resolved against the
//! session's base URL.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::body::{Body, MultipartPayload};
use crate::callback::{spawn_with_callback, spawn_with_handlers};
use crate::config::GeocoreConfig;
use crate::dispatch::{Dispatcher, FromJson, ToParams};
use crate::error::GeocoreError;
use crate::http::HttpMethod;
use crate::result::Result;
use crate::session::Session;
use crate::transport::Transport;
use crate::types::{AuthResult, GeocoreUser};

/// Server code meaning "this user id has never been registered".
pub const USER_NOT_REGISTERED: &str = "Auth.0001";

pub const AUTH_PATH: &str = "/auth";
pub const REGISTER_PATH: &str = "/register";

struct Inner<T> {
    dispatcher: Dispatcher<T>,
    device_id: String,
}

pub struct GeocoreClient<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for GeocoreClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport + 'static> GeocoreClient<T> {
    pub fn new(config: &GeocoreConfig, transport: T) -> Self {
        let session = Arc::new(Session::from_config(config));
        let device_id = config
            .device_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        Self {
            inner: Arc::new(Inner {
                dispatcher: Dispatcher::new(session, transport),
                device_id,
            }),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.inner.dispatcher.session()
    }

    pub fn transport(&self) -> &T {
        self.inner.dispatcher.transport()
    }

    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    /// Point the client at a backend. Callable any number of times.
    pub fn setup(&self, base_url: &str, project_id: &str) {
        self.session().setup(base_url, project_id);
    }

    /// The current token, or `TokenUndefined` before the first login.
    pub fn require_token(&self) -> Result<String> {
        self.session().token().ok_or(GeocoreError::TokenUndefined)
    }

    // ---------------------------------------------------------------------
    // Generic requests
    // ---------------------------------------------------------------------

    pub async fn request<R: FromJson>(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
    ) -> Result<R> {
        self.inner
            .dispatcher
            .dispatch_one(method, path, parameters, body)
            .await
    }

    pub async fn request_list<R: FromJson>(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
    ) -> Result<Vec<R>> {
        self.inner
            .dispatcher
            .dispatch_list(method, path, parameters, body)
            .await
    }

    /// Like `request`, with the body given as an untyped mapping. A
    /// `fileContents` key selects a multipart upload (see `Body::from_map`).
    pub async fn request_with_body_map<R: FromJson>(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Map<String, Value>>,
    ) -> Result<R> {
        let body = body.map(Body::from_map).transpose()?;
        self.request(method, path, parameters, body).await
    }

    pub async fn get<R: FromJson>(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
    ) -> Result<R> {
        self.request(HttpMethod::Get, path, parameters, None).await
    }

    pub async fn get_list<R: FromJson>(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
    ) -> Result<Vec<R>> {
        self.request_list(HttpMethod::Get, path, parameters, None)
            .await
    }

    /// GET that fails with `TokenUndefined` instead of going out unauthenticated.
    pub async fn get_authenticated<R: FromJson>(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
    ) -> Result<R> {
        self.require_token()?;
        self.get(path, parameters).await
    }

    pub async fn post<R: FromJson>(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
    ) -> Result<R> {
        self.request(HttpMethod::Post, path, parameters, body).await
    }

    pub async fn post_list<R: FromJson>(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
    ) -> Result<Vec<R>> {
        self.request_list(HttpMethod::Post, path, parameters, body)
            .await
    }

    pub async fn put<R: FromJson>(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
    ) -> Result<R> {
        self.request(HttpMethod::Put, path, parameters, body).await
    }

    pub async fn delete<R: FromJson>(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
    ) -> Result<R> {
        self.request(HttpMethod::Delete, path, parameters, None)
            .await
    }

    /// POST a single file as `multipart/form-data`.
    pub async fn upload<R: FromJson>(
        &self,
        path: &str,
        parameters: Option<Map<String, Value>>,
        payload: MultipartPayload,
    ) -> Result<R> {
        self.post(path, parameters, Some(Body::Multipart(payload)))
            .await
    }

    // ---------------------------------------------------------------------
    // Session lifecycle
    // ---------------------------------------------------------------------

    /// Log in and store the returned token. Returns the token.
    pub async fn login(&self, user_id: &str, password: &str) -> Result<String> {
        let project_id = self.session().project_id().ok_or(GeocoreError::InvalidState)?;
        let mut params = Map::new();
        params.insert("id".to_string(), Value::String(user_id.to_string()));
        params.insert("password".to_string(), Value::String(password.to_string()));
        params.insert("project_id".to_string(), Value::String(project_id));

        let node: Value = self.post(AUTH_PATH, Some(params), None).await?;
        let token = AuthResult::from_node(&node)
            .token
            .ok_or(GeocoreError::InvalidState)?;
        self.session().authenticate(user_id, &token);
        Ok(token)
    }

    /// Register `user` with the configured project.
    pub async fn register(&self, user: &GeocoreUser) -> Result<GeocoreUser> {
        let project_id = self.session().project_id().ok_or(GeocoreError::InvalidState)?;
        let mut params = Map::new();
        params.insert("project_id".to_string(), Value::String(project_id));

        let body = Body::Json(user.to_params()?);
        self.post(REGISTER_PATH, Some(params), Some(body)).await
    }

    /// Log in as this device's default user, registering it first if the
    /// server does not know it yet. Registration is attempted at most once.
    pub async fn login_with_default_user(&self) -> Result<String> {
        let project_id = self.session().project_id().ok_or(GeocoreError::InvalidState)?;
        let (user_id, password) = GeocoreUser::default_credentials(&project_id, self.device_id());

        match self.login(&user_id, &password).await {
            Err(err) if err.server_code() == Some(USER_NOT_REGISTERED) => {
                tracing::info!(user_id = %user_id, "default user not registered, registering");
                self.register(&GeocoreUser::default_user(&project_id, self.device_id()))
                    .await?;
                self.login(&user_id, &password).await
            }
            outcome => outcome,
        }
    }

    // ---------------------------------------------------------------------
    // Callback forms
    // ---------------------------------------------------------------------

    pub fn request_with_callback<R, C>(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
        callback: C,
    ) -> JoinHandle<()>
    where
        R: FromJson + Send + 'static,
        C: FnOnce(Result<R>) + Send + 'static,
    {
        let client = self.clone();
        let path = path.to_string();
        spawn_with_callback(
            async move { client.request(method, &path, parameters, body).await },
            callback,
        )
    }

    pub fn request_list_with_callback<R, C>(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
        callback: C,
    ) -> JoinHandle<()>
    where
        R: FromJson + Send + 'static,
        C: FnOnce(Result<Vec<R>>) + Send + 'static,
    {
        let client = self.clone();
        let path = path.to_string();
        spawn_with_callback(
            async move { client.request_list(method, &path, parameters, body).await },
            callback,
        )
    }

    /// Callback form with separate success and failure handlers.
    pub fn request_with_handlers<R, S, E>(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Option<Map<String, Value>>,
        body: Option<Body>,
        fulfill: S,
        reject: E,
    ) -> JoinHandle<()>
    where
        R: FromJson + Send + 'static,
        S: FnOnce(R) + Send + 'static,
        E: FnOnce(GeocoreError) + Send + 'static,
    {
        let client = self.clone();
        let path = path.to_string();
        spawn_with_handlers(
            async move { client.request(method, &path, parameters, body).await },
            fulfill,
            reject,
        )
    }

    pub fn login_with_callback<C>(&self, user_id: &str, password: &str, callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<String>) + Send + 'static,
    {
        let client = self.clone();
        let user_id = user_id.to_string();
        let password = password.to_string();
        spawn_with_callback(
            async move { client.login(&user_id, &password).await },
            callback,
        )
    }

    pub fn register_with_callback<C>(&self, user: GeocoreUser, callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<GeocoreUser>) + Send + 'static,
    {
        let client = self.clone();
        spawn_with_callback(async move { client.register(&user).await }, callback)
    }

    pub fn login_with_default_user_with_callback<C>(&self, callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<String>) + Send + 'static,
    {
        let client = self.clone();
        spawn_with_callback(
            async move { client.login_with_default_user().await },
            callback,
        )
    }
}
