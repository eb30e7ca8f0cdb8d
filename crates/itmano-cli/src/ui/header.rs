//! Navigation header, rendered from the current session.

use itmano_core::Session;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

const BRAND: &str = "ITMANO";

const ROUTES: [&str; 4] = ["Home", "Services", "About", "Contact"];

/// Render the header line for `session`
pub fn render_header(session: &Session) -> String {
    let account = match session.user() {
        Some(user) => format!("Signed in as {} | Logout", user.name),
        None => "Login | Register".to_string(),
    };
    format!("{}  {}  [{}]", BRAND, ROUTES.join(" | "), account)
}

/// Follow session transitions for as long as the session manager lives,
/// logging the header each time it would re-render.
pub fn spawn_header_watcher(mut rx: watch::Receiver<Session>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let header = render_header(&rx.borrow_and_update());
            info!(%header, "Session changed");
        }
    })
}
