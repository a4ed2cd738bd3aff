//! Page redirection driven only by session state.

use crate::auth::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Signup,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Dashboard => "/dashboard",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Landing),
            "/login" => Some(Route::Login),
            "/signup" => Some(Route::Signup),
            "/dashboard" => Some(Route::Dashboard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    Redirect(Route),
}

/// Decides whether the page at `route` should redirect.
pub fn resolve(route: Route, session: &SessionState) -> Navigation {
    if session.loading {
        return Navigation::Stay;
    }
    let signed_in = session.is_signed_in();
    match route {
        Route::Landing if signed_in => Navigation::Redirect(Route::Dashboard),
        Route::Landing => Navigation::Redirect(Route::Login),
        Route::Login | Route::Signup if signed_in => Navigation::Redirect(Route::Dashboard),
        Route::Dashboard if !signed_in => Navigation::Redirect(Route::Login),
        _ => Navigation::Stay,
    }
}

/// Follows redirects until the page is stable.
pub fn settle(route: Route, session: &SessionState) -> Route {
    let mut current = route;
    while let Navigation::Redirect(next) = resolve(current, session) {
        current = next;
    }
    current
}

pub fn after_sign_up() -> Route {
    Route::Dashboard
}

pub fn after_sign_out() -> Route {
    Route::Login
}
