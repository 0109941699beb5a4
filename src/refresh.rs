use std::sync::Arc;

use http::header::AUTHORIZATION;
use http::Method;
use serde_json::Value;
use tracing::{info, warn};

use crate::credential::{AccessToken, TokenStore};
use crate::error::RefreshError;
use crate::response::{envelope_message, fallback_message};
use crate::session::SessionExpiry;
use crate::singleflight::SingleFlight;
use crate::{Client, InMemoryResponseExt};

pub static REFRESH_FLIGHT: &str = "auth.refresh";

pub type RefreshOutcome = Result<AccessToken, RefreshError>;

/// Mints new access tokens from the refresh cookie, at most one exchange at a time.
///
/// Every caller that asks while an exchange is running gets that exchange's outcome. The
/// outcome's side effects (storing the token, or clearing it and expiring the session) run once
/// per exchange, not once per caller. An exchange that fails in transport has no side effects.
#[derive(Debug)]
pub struct RefreshCoordinator {
    client: Arc<Client>,
    refresh_path: String,
    store: Arc<dyn TokenStore>,
    session: Arc<SessionExpiry>,
    flights: SingleFlight<&'static str, RefreshOutcome>,
}

impl RefreshCoordinator {
    pub fn new(client: Arc<Client>, refresh_path: &str, store: Arc<dyn TokenStore>, session: Arc<SessionExpiry>) -> Self {
        Self {
            client,
            refresh_path: refresh_path.to_string(),
            store,
            session,
            flights: SingleFlight::new(),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.flights.is_pending(&REFRESH_FLIGHT)
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let client = Arc::clone(&self.client);
        let path = self.refresh_path.clone();
        let store = Arc::clone(&self.store);
        let session = Arc::clone(&self.session);
        self.flights
            .run(REFRESH_FLIGHT, move || async move {
                let outcome = exchange(&client, &path).await;
                match &outcome {
                    Ok(token) => {
                        store.set(token.clone());
                        info!("access token refreshed");
                    }
                    // the server never judged the credential; the session may still be valid
                    Err(e @ RefreshError::Transport(_)) => {
                        warn!(error = %e, "access token refresh did not reach the server");
                    }
                    Err(e) => {
                        warn!(error = %e, "access token refresh failed, expiring session");
                        store.clear();
                        session.on_session_expired();
                    }
                }
                outcome
            })
            .await
    }
}

/// `POST <refresh_path>` with only the ambient cookie as credential. Expects `{ data: { access_token } }`.
async fn exchange(client: &Client, path: &str) -> RefreshOutcome {
    let mut request = client
        .request(Method::POST, path)
        .build()
        .map_err(|e| RefreshError::Transport(e.to_string()))?;
    request.headers_mut().remove(AUTHORIZATION);
    let res = client
        .send(request)
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;
    let status = res.status();
    let payload = res.json_payload().ok().flatten();
    if !status.is_success() {
        let message = payload
            .as_ref()
            .and_then(envelope_message)
            .unwrap_or_else(|| fallback_message(status));
        return Err(RefreshError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    payload
        .as_ref()
        .and_then(|p| p.get("data"))
        .and_then(|data| data.get("access_token"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(AccessToken::new)
        .ok_or_else(|| RefreshError::Malformed("missing data.access_token".to_string()))
}
