use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use indexmap::IndexMap;

/// Authentication state observed by session listeners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Whether a credential is held.
    pub is_authenticated: bool,
}

/// Opaque access credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Extract the access token from a `Set-Cookie` header value.
    ///
    /// Returns `None` for other cookies and for the empty value used to
    /// clear the cookie.
    pub fn from_set_cookie(header: &str) -> Option<Self> {
        let pair = header.split(';').next()?;
        let (name, value) = pair.split_once('=')?;
        (name.trim() == crate::ACCESS_TOKEN_COOKIE && !value.trim().is_empty())
            .then(|| Self::new(value.trim()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

type Listener = Arc<dyn Fn(AuthState) + Send + Sync>;

#[derive(Default)]
struct Inner {
    credential: Option<Credential>,
    listeners: IndexMap<u64, Listener>,
    next_listener_id: u64,
}

/// Session context.
///
/// Owns the access credential and notifies registered listeners whenever
/// the authentication state changes. Cloning yields another handle to the
/// same session.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<Mutex<Inner>>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("auth_state", &self.auth_state())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Create an unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session holding `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        let session = Self::default();
        lock(&session.inner).credential = Some(credential);
        session
    }

    /// Current authentication state.
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            is_authenticated: lock(&self.inner).credential.is_some(),
        }
    }

    /// Current credential.
    pub fn credential(&self) -> Option<Credential> {
        lock(&self.inner).credential.clone()
    }

    /// Store a freshly issued credential.
    pub fn establish(&self, credential: Credential) {
        self.replace(Some(credential));
    }

    /// Drop the credential, e.g. after logout or when it has been rejected.
    pub fn invalidate(&self) {
        self.replace(None);
    }

    fn replace(&self, credential: Option<Credential>) {
        let (changed, state, listeners) = {
            let mut inner = lock(&self.inner);
            let was_authenticated = inner.credential.is_some();
            inner.credential = credential;
            let state = AuthState {
                is_authenticated: inner.credential.is_some(),
            };
            let listeners = inner.listeners.values().cloned().collect::<Vec<_>>();
            (was_authenticated != state.is_authenticated, state, listeners)
        };
        if changed {
            tracing::debug!(?state, "auth state changed");
            for listener in listeners {
                listener(state);
            }
        }
    }

    /// Register a listener for authentication state changes.
    ///
    /// The listener stays registered until the returned [`Subscription`]
    /// is unsubscribed or dropped.
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe(&self, listener: impl Fn(AuthState) + Send + Sync + 'static) -> Subscription {
        let mut inner = lock(&self.inner);
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.insert(id, Arc::new(listener));
        Subscription {
            id,
            session: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

/// Handle of a registered session listener.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    session: Weak<Mutex<Inner>>,
}

impl Subscription {
    /// Unregister the listener.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.session.upgrade() {
            lock(&inner).listeners.shift_remove(&self.id);
        }
    }
}
