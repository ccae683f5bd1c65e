//! Single-flight session renewal.
//!
//! At most one renewal is outstanding per client. The first caller to see a
//! 401 starts it; everyone else who sees a 401 before it settles awaits the
//! same shared future and receives the same outcome. The slot is emptied by
//! the renewal itself, before its result is published, so no caller can
//! pick up a settled renewal as if it were still running.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::RenewalError;
use crate::session::{AuthResponse, SessionStore};

/// Outcome of a renewal: the new access credential.
pub(crate) type RenewalResult = Result<SecretString, RenewalError>;

type SharedRenewal = Shared<BoxFuture<'static, RenewalResult>>;

/// The pending-renewal cell.
#[derive(Clone, Default)]
pub(crate) struct RenewalSlot {
    pending: Arc<Mutex<Option<SharedRenewal>>>,
}

impl RenewalSlot {
    /// Join the in-flight renewal, or start one with `start`.
    ///
    /// `start` runs at most once per renewal, under the slot lock.
    pub(crate) async fn get_or_start<F>(&self, start: F) -> SharedRenewal
    where
        F: FnOnce() -> BoxFuture<'static, RenewalResult>,
    {
        let mut pending = self.pending.lock().await;
        if let Some(renewal) = pending.as_ref() {
            return renewal.clone();
        }

        let slot = Arc::clone(&self.pending);
        let work = start();
        let renewal = async move {
            let result = work.await;
            slot.lock().await.take();
            result
        }
        .boxed()
        .shared();

        *pending = Some(renewal.clone());
        renewal
    }

    /// Whether a renewal is currently outstanding.
    #[cfg(test)]
    pub(crate) async fn in_flight(&self) -> bool {
        self.pending.lock().await.is_some()
    }
}

/// Exchange the stored refresh credential for a new pair.
///
/// On success the pair is persisted before the new access credential is
/// returned. On any failure every session slot is cleared.
pub(crate) async fn refresh_session(
    client: reqwest::Client,
    refresh_url: String,
    session: SessionStore,
) -> RenewalResult {
    let result = exchange_refresh_token(&client, &refresh_url, &session).await;

    match &result {
        Ok(_) => info!("Session renewed"),
        Err(e) => {
            warn!(error = %e, "Session renewal failed, clearing credentials");
            session.clear();
        }
    }

    result
}

async fn exchange_refresh_token(
    client: &reqwest::Client,
    refresh_url: &str,
    session: &SessionStore,
) -> RenewalResult {
    let refresh_token = session
        .refresh_token()
        .ok_or(RenewalError::NoRefreshToken)?;

    let response = client
        .post(refresh_url)
        .json(&serde_json::json!({
            "refreshToken": refresh_token.expose_secret()
        }))
        .send()
        .await
        .map_err(|e| RenewalError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RenewalError::Rejected(status.as_u16()));
    }

    let renewed: AuthResponse = response
        .json()
        .await
        .map_err(|e| RenewalError::Transport(e.to_string()))?;

    session
        .save_tokens(&renewed.tokens)
        .map_err(|e| RenewalError::Storage(e.to_string()))?;

    Ok(renewed.tokens.access_token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{mpsc, oneshot};

    const CALLERS: usize = 8;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_renewal() {
        let slot = RenewalSlot::default();
        let starts = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let release_rx = Arc::new(Mutex::new(Some(release_rx)));
        let (ready_tx, mut ready_rx) = mpsc::unbounded_channel();

        let mut callers = Vec::new();
        for _ in 0..CALLERS {
            let slot = slot.clone();
            let starts = Arc::clone(&starts);
            let release_rx = Arc::clone(&release_rx);
            let ready_tx = ready_tx.clone();

            callers.push(tokio::spawn(async move {
                let renewal = slot
                    .get_or_start(|| {
                        starts.fetch_add(1, Ordering::SeqCst);
                        async move {
                            let rx = release_rx.lock().await.take();
                            if let Some(rx) = rx {
                                let _ = rx.await;
                            }
                            Ok(SecretString::from("fresh-access"))
                        }
                        .boxed()
                    })
                    .await;
                ready_tx.send(()).unwrap();
                renewal.await
            }));
        }

        for _ in 0..CALLERS {
            ready_rx.recv().await.unwrap();
        }
        assert!(slot.in_flight().await);

        release_tx.send(()).unwrap();
        for caller in callers {
            let token = caller.await.unwrap().unwrap();
            assert_eq!(token.expose_secret(), "fresh-access");
        }

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(!slot.in_flight().await);
    }

    #[tokio::test]
    async fn test_failure_is_shared() {
        let slot = RenewalSlot::default();
        let first = slot
            .get_or_start(|| async { Err(RenewalError::Rejected(401)) }.boxed())
            .await;
        let second = slot
            .get_or_start(|| async { Ok(SecretString::from("never")) }.boxed())
            .await;

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a.unwrap_err(), RenewalError::Rejected(401));
        assert_eq!(b.unwrap_err(), RenewalError::Rejected(401));
    }

    #[tokio::test]
    async fn test_slot_is_empty_when_result_is_observed() {
        let slot = RenewalSlot::default();
        let renewal = slot
            .get_or_start(|| async { Ok(SecretString::from("a")) }.boxed())
            .await;

        let _ = renewal.await;
        assert!(!slot.in_flight().await);

        // A later 401 starts a fresh renewal.
        let starts = AtomicUsize::new(0);
        let renewal = slot
            .get_or_start(|| {
                starts.fetch_add(1, Ordering::SeqCst);
                async { Ok(SecretString::from("b")) }.boxed()
            })
            .await;
        assert_eq!(renewal.await.unwrap().expose_secret(), "b");
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }
}
