//! Access rules for the application's views.

use crate::session::SessionContext;

/// Who may open a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone.
    Public,
    /// Logged in users.
    Authenticated,
    /// Administrators only.
    Admin,
}

/// Application views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Login form.
    Login,
    /// Landing page after login.
    Dashboard,
    /// Catalog.
    Books,
    /// Loans.
    Borrowings,
    /// Account administration.
    Users,
    /// Statistics.
    Reports,
}

impl Route {
    /// URL path.
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Books => "/books",
            Route::Borrowings => "/borrowings",
            Route::Users => "/users",
            Route::Reports => "/reports",
        }
    }

    /// Human readable title.
    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Dashboard => "Dashboard",
            Route::Books => "Books",
            Route::Borrowings => "Borrowings",
            Route::Users => "Users",
            Route::Reports => "Reports",
        }
    }

    /// Access level required to open the view.
    pub fn access(self) -> Access {
        match self {
            Route::Login => Access::Public,
            Route::Users => Access::Admin,
            _ => Access::Authenticated,
        }
    }
}

/// Outcome of a navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Open the requested view.
    Proceed,
    /// Log in first, then come back to `redirect`.
    RedirectToLogin {
        /// Path to return to after login.
        redirect: String,
    },
    /// Go somewhere else instead.
    Redirect(Route),
}

/// Decide whether the session may open `to`.
pub fn check(to: Route, session: &SessionContext) -> Decision {
    let authenticated = session.is_authenticated();

    match to.access() {
        Access::Authenticated | Access::Admin if !authenticated => Decision::RedirectToLogin {
            redirect: to.path().to_string(),
        },
        Access::Admin if !session.is_admin() => Decision::Redirect(Route::Dashboard),
        Access::Public if to == Route::Login && authenticated => {
            Decision::Redirect(Route::Dashboard)
        }
        _ => Decision::Proceed,
    }
}
