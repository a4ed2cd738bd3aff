use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use super::client::AuthClient;
use super::error::AuthError;
use super::password::PasswordDigest;
use crate::domain::User;

pub const MIN_PASSWORD_LEN: usize = 6;

pub type Response<T> = oneshot::Sender<Result<T, AuthError>>;

pub enum AuthRequest {
    SignUp {
        email: String,
        password: String,
        respond_to: Response<User>,
    },
    SignIn {
        email: String,
        password: String,
        respond_to: Response<User>,
    },
    SignOut {
        respond_to: Response<()>,
    },
    CurrentUser {
        respond_to: Response<Option<User>>,
    },
    Subscribe {
        sink: mpsc::UnboundedSender<Option<User>>,
        respond_to: Response<()>,
    },
    Shutdown,
    #[cfg(test)]
    SubscriberCount {
        respond_to: Response<usize>,
    },
}

struct Account {
    user: User,
    password: PasswordDigest,
}

/// In-process auth provider.
///
/// Holds accounts and the single current session. Every session change is
/// pushed to all subscribers; a new subscriber first receives the current
/// session.
pub struct AuthProvider {
    receiver: mpsc::Receiver<AuthRequest>,
    accounts: HashMap<String, Account>,
    current: Option<User>,
    subscribers: Vec<mpsc::UnboundedSender<Option<User>>>,
    next_uid_fn: Box<dyn Fn() -> String + Send + Sync>,
}

impl AuthProvider {
    pub fn new(
        buffer_size: usize,
        next_uid_fn: impl Fn() -> String + Send + Sync + 'static,
    ) -> (Self, AuthClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let provider = Self {
            receiver,
            accounts: HashMap::new(),
            current: None,
            subscribers: Vec::new(),
            next_uid_fn: Box::new(next_uid_fn),
        };
        (provider, AuthClient::new(sender))
    }

    #[instrument(name = "auth_provider", skip(self))]
    pub async fn run(mut self) {
        info!("AuthProvider starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                AuthRequest::SignUp {
                    email,
                    password,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_sign_up(&email, &password));
                }
                AuthRequest::SignIn {
                    email,
                    password,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_sign_in(&email, &password));
                }
                AuthRequest::SignOut { respond_to } => {
                    self.handle_sign_out();
                    let _ = respond_to.send(Ok(()));
                }
                AuthRequest::CurrentUser { respond_to } => {
                    let _ = respond_to.send(Ok(self.current.clone()));
                }
                AuthRequest::Subscribe { sink, respond_to } => {
                    if sink.send(self.current.clone()).is_ok() {
                        self.subscribers.push(sink);
                    }
                    let _ = respond_to.send(Ok(()));
                }
                AuthRequest::Shutdown => {
                    info!("AuthProvider shutting down");
                    break;
                }
                #[cfg(test)]
                AuthRequest::SubscriberCount { respond_to } => {
                    self.subscribers.retain(|sink| !sink.is_closed());
                    let _ = respond_to.send(Ok(self.subscribers.len()));
                }
            }
        }

        info!("AuthProvider stopped");
    }

    #[instrument(skip(self, password))]
    fn handle_sign_up(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        debug!("Processing sign_up request");

        let key = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            warn!("Sign-up rejected: weak password");
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.accounts.contains_key(&key) {
            warn!("Sign-up rejected: email already in use");
            return Err(AuthError::EmailAlreadyInUse(key));
        }

        let user = User::new((self.next_uid_fn)(), key.clone());
        self.accounts.insert(
            key,
            Account {
                user: user.clone(),
                password: PasswordDigest::new(password),
            },
        );

        info!(uid = %user.uid, "Account created");
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    #[instrument(skip(self, password))]
    fn handle_sign_in(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        debug!("Processing sign_in request");

        let key = normalize_email(email).map_err(|_| AuthError::InvalidCredential)?;
        let user = match self.accounts.get(&key) {
            Some(account) if account.password.verify(password) => account.user.clone(),
            _ => {
                warn!("Sign-in rejected");
                return Err(AuthError::InvalidCredential);
            }
        };

        info!(uid = %user.uid, "Signed in");
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    fn handle_sign_out(&mut self) {
        if let Some(user) = &self.current {
            info!(uid = %user.uid, "Signed out");
            self.set_session(None);
        }
    }

    fn set_session(&mut self, user: Option<User>) {
        self.current = user;
        let current = &self.current;
        self.subscribers.retain(|sink| sink.send(current.clone()).is_ok());
    }
}

/// Lower-cased, trimmed email, or `InvalidEmail` when it is not `local@domain`.
fn normalize_email(email: &str) -> Result<String, AuthError> {
    let trimmed = email.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(trimmed.to_lowercase())
    } else {
        Err(AuthError::InvalidEmail(trimmed.to_string()))
    }
}
