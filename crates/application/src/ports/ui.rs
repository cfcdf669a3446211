//! User-facing collaborators: navigation and notices

use std::time::Duration;

/// Port for the router of the hosting application.
pub trait Navigator: Send + Sync {
    /// The route currently displayed.
    fn current_route(&self) -> String;

    /// Navigates to `route`.
    fn redirect(&self, route: &str);
}

/// Port for transient messages and the session-expiring prompt.
pub trait Notifier: Send + Sync {
    /// Shows a success message.
    fn success(&self, message: &str);

    /// Shows an error message.
    fn error(&self, message: &str);

    /// Asks the user whether to extend a session that ends in `remaining`.
    fn session_expiring(&self, remaining: Duration);
}
