//! Browser and JSON surface for quiz sessions
//!
//! | Module     | Purpose |
//! |------------|---------|
//! | `server`   | Listener setup and middleware |
//! | `routes`   | Handlers for the page, form posts and JSON API |
//! | `sessions` | Cookie-scoped session registry |
//! | `page`     | HTML rendering of a `SessionView` |

pub mod page;
pub mod routes;
pub mod server;
pub mod sessions;

pub use routes::{quiz_routes, AppState};
pub use server::QuizServer;
pub use sessions::{SessionRegistry, SESSION_COOKIE};
