use std::any::Any;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, warn};

use crate::database::{DatabaseError, TxScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input, unknown reference, missing row
    Client,
    Server,
}

/// Workflow-level failure. `message` is safe to show to clients; `detail`
/// carries the internal cause for logs only.
#[derive(Debug, Clone, Error)]
#[error("{message}: {detail}")]
pub struct ServiceError {
    pub class: ErrorClass,
    pub message: &'static str,
    pub detail: String,
}

impl ServiceError {
    pub fn client(message: &'static str, detail: impl ToString) -> Self {
        Self {
            class: ErrorClass::Client,
            message,
            detail: detail.to_string(),
        }
    }

    pub fn server(message: &'static str, detail: impl ToString) -> Self {
        Self {
            class: ErrorClass::Server,
            message,
            detail: detail.to_string(),
        }
    }

    /// Foreign-key violations are the caller's fault; anything else is ours.
    pub fn from_store(err: DatabaseError, on_foreign_key: &'static str, otherwise: &'static str) -> Self {
        if err.is_foreign_key_violation() {
            Self::client(on_foreign_key, err)
        } else {
            Self::server(otherwise, err)
        }
    }

    /// `NotFound` becomes a client error, anything else a server error.
    pub fn from_lookup(err: DatabaseError, on_not_found: &'static str, otherwise: &'static str) -> Self {
        if err.is_not_found() {
            Self::client(on_not_found, err)
        } else {
            Self::server(otherwise, err)
        }
    }

    pub fn is_client(&self) -> bool {
        self.class == ErrorClass::Client
    }

    pub fn code(&self) -> u16 {
        match self.class {
            ErrorClass::Client => 400,
            ErrorClass::Server => 500,
        }
    }

    pub fn log(&self) {
        match self.class {
            ErrorClass::Client => warn!(message = self.message, detail = %self.detail, "Request rejected"),
            ErrorClass::Server => error!(message = self.message, detail = %self.detail, "Workflow failed"),
        }
    }
}

/// Successful workflow result: payload, status code and message.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub data: T,
    pub code: u16,
    pub message: &'static str,
}

impl<T> Outcome<T> {
    pub fn ok(data: T, message: &'static str) -> Self {
        Self { data, code: 200, message }
    }

    pub fn created(data: T, message: &'static str) -> Self {
        Self { data, code: 201, message }
    }
}

pub type ServiceResult<T> = Result<Outcome<T>, ServiceError>;

/// Bounds a workflow by `deadline`. When it elapses the workflow future is
/// dropped, which also drops (and so rolls back) any scope it still holds.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    within(Instant::now() + deadline, fut).await
}

/// Bounds one step of a workflow by an instant shared with its other steps.
pub async fn within<T, F>(until: Instant, fut: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout_at(until, fut).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::server("request timed out", "workflow deadline elapsed")),
    }
}

/// Ends a scope according to how the work inside it went.
///
/// `result` is the scoped work after `catch_unwind`: committed on success,
/// rolled back on an ordinary error, and rolled back then reported as
/// `fault_message` when the work panicked.
pub async fn settle<S, T>(
    scope: S,
    result: Result<Result<T, ServiceError>, Box<dyn Any + Send>>,
    fault_message: &'static str,
) -> Result<T, ServiceError>
where
    S: TxScope,
{
    match result {
        Ok(Ok(value)) => {
            scope
                .commit()
                .await
                .map_err(|e| ServiceError::server("failed to commit database transaction", e))?;
            Ok(value)
        }
        Ok(Err(err)) => {
            scope.rollback().await;
            Err(err)
        }
        Err(panic) => {
            scope.rollback().await;
            Err(ServiceError::server(fault_message, panic_detail(panic.as_ref())))
        }
    }
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
