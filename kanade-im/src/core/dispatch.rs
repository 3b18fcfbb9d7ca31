//! Commit/output dispatch: the parts of an engine response that act on the
//! host directly (committed text, links, tool launches).

use std::collections::HashSet;
use std::sync::OnceLock;

use tracing::{debug, info};

use super::host::HostClient;
use super::protocol::EngineResponse;

/// Host applications in which links and tools must never be opened
/// (credential prompts, the login window, the screen saver lock).
const UNTRUSTED_CLIENTS: &[&str] = &[
    "com.apple.securityagent",
    "com.apple.loginwindow",
    "com.apple.screensaver.engine",
    "org.gnome.shell.polkit",
    "org.kde.polkit-kde-authentication-agent-1",
];

static DENYLIST: OnceLock<HashSet<&'static str>> = OnceLock::new();

fn denylist() -> &'static HashSet<&'static str> {
    DENYLIST.get_or_init(|| UNTRUSTED_CLIENTS.iter().copied().collect())
}

/// True unless `client_id` names a trust-sensitive host context.
/// Comparison is case-insensitive.
pub fn is_trusted_client(client_id: &str) -> bool {
    !denylist().contains(client_id.to_ascii_lowercase().as_str())
}

/// Apply the host-facing parts of `response` and remove them from it.
///
/// Order: link, committed text, tool. Committed text is taken out of the
/// response so later handling of the same value cannot insert it twice.
/// Returns the committed text, if any.
pub fn deliver(response: &mut EngineResponse, host: &mut dyn HostClient) -> Option<String> {
    let trusted = is_trusted_client(host.client_id());

    if let Some(url) = response.url.take() {
        if trusted {
            info!("opening link from engine");
            host.open_link(&url);
        } else {
            debug!("suppressed link in untrusted client {}", host.client_id());
        }
    }

    let committed = response.result.take();
    if let Some(text) = &committed {
        debug!("commit: {:?}", text);
        host.insert_text(text);
    }

    if let Some(tool) = response.launch_tool.take() {
        if trusted {
            host.launch_tool(tool);
        } else {
            debug!("suppressed {:?} launch in untrusted client {}", tool, host.client_id());
        }
    }

    committed
}
