//! Bridges between the future-based API and callback-style consumers.
//!
//! Every `*_with_callback` method on `GeocoreClient` is the corresponding
//! async method run through `spawn_with_callback`, so both styles share one
//! code path and can only differ in how the result is delivered.

use std::future::Future;

use tokio::task::JoinHandle;

use crate::error::GeocoreError;
use crate::result::{Result, ResultExt};

/// Drive `future` on the current tokio runtime and hand its result to
/// `callback`. Must be called from within a runtime.
pub fn spawn_with_callback<T, F, C>(future: F, callback: C) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
    C: FnOnce(Result<T>) + Send + 'static,
{
    tokio::spawn(async move { callback(future.await) })
}

/// Like `spawn_with_callback`, with separate success and failure handlers.
pub fn spawn_with_handlers<T, F, S, R>(future: F, fulfill: S, reject: R) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
    S: FnOnce(T) + Send + 'static,
    R: FnOnce(GeocoreError) + Send + 'static,
{
    spawn_with_callback(future, move |result| result.propagate(fulfill, reject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn callback_receives_result() {
        let (tx, rx) = oneshot::channel();
        spawn_with_callback(async { Ok::<_, GeocoreError>(42) }, move |r| {
            let _ = tx.send(r);
        })
        .await
        .unwrap();
        assert_eq!(rx.await.unwrap().unwrap(), 42);
    }

    #[tokio::test]
    async fn handlers_route_failures_to_reject() {
        let (tx, rx) = oneshot::channel::<&'static str>();
        let (tx_ok, tx_err) = {
            let tx = std::sync::Arc::new(parking_lot::Mutex::new(Some(tx)));
            (tx.clone(), tx)
        };
        spawn_with_handlers(
            async { Err::<u8, _>(GeocoreError::UnauthorizedAccess) },
            move |_| {
                if let Some(tx) = tx_ok.lock().take() {
                    let _ = tx.send("fulfill");
                }
            },
            move |e| {
                assert!(matches!(e, GeocoreError::UnauthorizedAccess));
                if let Some(tx) = tx_err.lock().take() {
                    let _ = tx.send("reject");
                }
            },
        )
        .await
        .unwrap();
        assert_eq!(rx.await.unwrap(), "reject");
    }
}
