use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::credential::TokenStore;
use crate::notify::Notifier;

pub static SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again";

/// Navigation port: where the user is, and how to send them to the login surface.
pub trait Navigator: Send + Sync + Debug {
    fn current_location(&self) -> String;
    fn redirect_to_login(&self, return_path: &str);
}

/// Navigator for hosts without a router. Tracks a location and moves it on redirect.
#[derive(Debug)]
pub struct InMemoryNavigator {
    login_route: String,
    location: RwLock<String>,
    redirects: RwLock<Vec<String>>,
}

impl InMemoryNavigator {
    pub fn new(login_route: &str, location: &str) -> Self {
        Self {
            login_route: login_route.to_string(),
            location: RwLock::new(location.to_string()),
            redirects: RwLock::new(Vec::new()),
        }
    }

    pub fn navigate(&self, location: &str) {
        *self.location.write().unwrap_or_else(PoisonError::into_inner) = location.to_string();
    }

    /// Every return path passed to [`Navigator::redirect_to_login`], oldest first.
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for InMemoryNavigator {
    fn current_location(&self) -> String {
        self.location.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn redirect_to_login(&self, return_path: &str) {
        let target = format!("{}?redirect={}", self.login_route, urlencoding::encode(return_path));
        info!(%target, "redirecting to login");
        self.redirects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(return_path.to_string());
        self.navigate(&target);
    }
}

/// True when `location` (path plus optional query) is the login route or somewhere below it.
pub fn is_login_surface(location: &str, login_route: &str) -> bool {
    let path = location.split(['?', '#']).next().unwrap_or_default();
    let login_route = login_route.trim_end_matches('/');
    path.trim_end_matches('/') == login_route
        || path.strip_prefix(login_route).is_some_and(|rest| rest.starts_with('/'))
}

/// Reacts to a session that cannot be recovered: forget the credentials and send the user to log in.
#[derive(Debug)]
pub struct SessionExpiry {
    store: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl SessionExpiry {
    pub fn new(
        store: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        login_route: &str,
    ) -> Self {
        Self {
            store,
            notifier,
            navigator,
            login_route: login_route.to_string(),
        }
    }

    /// Clears credentials. Unless the user already is on the login surface, tells them and redirects
    /// there with the current location as the return path. Repeated calls only clear again.
    pub fn on_session_expired(&self) {
        self.store.clear();
        let location = self.navigator.current_location();
        if is_login_surface(&location, &self.login_route) {
            debug!(%location, "session expired while on the login surface");
            return;
        }
        self.notifier.notify_error(SESSION_EXPIRED_MESSAGE);
        self.navigator.redirect_to_login(&location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::MemoryTokenStore;
    use crate::mock::RecordingNotifier;

    fn expiry(location: &str) -> (SessionExpiry, Arc<MemoryTokenStore>, Arc<RecordingNotifier>, Arc<InMemoryNavigator>) {
        let store = Arc::new(MemoryTokenStore::with_token("stale"));
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(InMemoryNavigator::new("/auth/login", location));
        let expiry = SessionExpiry::new(store.clone(), notifier.clone(), navigator.clone(), "/auth/login");
        (expiry, store, notifier, navigator)
    }

    #[test]
    fn test_is_login_surface() {
        assert!(is_login_surface("/auth/login", "/auth/login"));
        assert!(is_login_surface("/auth/login?redirect=%2Fx", "/auth/login"));
        assert!(is_login_surface("/auth/login/", "/auth/login"));
        assert!(!is_login_surface("/auth/login-help", "/auth/login"));
        assert!(!is_login_surface("/merchant/product/list", "/auth/login"));
    }

    #[test]
    fn test_expiry_redirects_with_return_path() {
        let (expiry, store, notifier, navigator) = expiry("/merchant/product/list?page=2");
        expiry.on_session_expired();
        assert_eq!(store.get(), None);
        assert_eq!(notifier.errors(), vec![SESSION_EXPIRED_MESSAGE.to_string()]);
        assert_eq!(navigator.redirects(), vec!["/merchant/product/list?page=2".to_string()]);
        assert_eq!(
            navigator.current_location(),
            "/auth/login?redirect=%2Fmerchant%2Fproduct%2Flist%3Fpage%3D2"
        );
    }

    #[test]
    fn test_expiry_is_idempotent() {
        let (expiry, store, notifier, navigator) = expiry("/admin/dashboard");
        expiry.on_session_expired();
        let location_after_first = navigator.current_location();
        expiry.on_session_expired();
        assert_eq!(store.get(), None);
        assert_eq!(notifier.errors().len(), 1);
        assert_eq!(navigator.redirects().len(), 1);
        assert_eq!(navigator.current_location(), location_after_first);
    }

    #[test]
    fn test_expiry_on_login_surface_only_clears() {
        let (expiry, store, notifier, navigator) = expiry("/auth/login");
        expiry.on_session_expired();
        assert_eq!(store.get(), None);
        assert!(notifier.notifications().is_empty());
        assert!(navigator.redirects().is_empty());
    }
}
