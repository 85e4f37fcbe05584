//! Home directory resolution and logging setup.

use std::cell::RefCell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Overrides the default home directory.
pub const HOME_ENV: &str = "SIGCALL_HOME";

/// Tracing filter directives, e.g. `sigcall=debug`.
pub const LOG_ENV: &str = "SIGCALL_LOG";

thread_local! {
    static CUSTOM_HOME: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

/// Set a custom sigcall home for the current thread
pub fn set_custom_home(path: Option<PathBuf>) {
    CUSTOM_HOME.with(|p| {
        *p.borrow_mut() = path;
    });
}

fn get_custom_home() -> Option<PathBuf> {
    CUSTOM_HOME.with(|p| p.borrow().clone())
}

/// Get the user's home directory in a cross-platform way.
pub fn get_home_dir() -> Option<PathBuf> {
    // Try HOME first (Unix-like systems)
    if let Some(home) = std::env::var_os("HOME") {
        return Some(PathBuf::from(home));
    }

    // Try USERPROFILE (Windows)
    if let Some(userprofile) = std::env::var_os("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }

    // Try HOMEDRIVE + HOMEPATH (older Windows)
    if let (Some(homedrive), Some(homepath)) =
        (std::env::var_os("HOMEDRIVE"), std::env::var_os("HOMEPATH"))
    {
        let mut path = PathBuf::from(homedrive);
        path.push(homepath);
        return Some(path);
    }

    None
}

/// Where sigcall keeps its files: the custom home if set, then
/// `$SIGCALL_HOME`, then `~/.sigcall`.
pub fn sigcall_home() -> Option<PathBuf> {
    if let Some(custom) = get_custom_home() {
        return Some(custom);
    }
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(home));
    }
    get_home_dir().map(|home| home.join(".sigcall"))
}

/// Error message when no home directory can be determined.
pub const NO_HOME_ERROR: &str =
    "Error: could not determine a home directory. Set SIGCALL_HOME or pass --home.";

/// Resolve the sigcall home or exit with an error message.
pub fn sigcall_home_or_exit() -> PathBuf {
    sigcall_home().unwrap_or_else(|| crate::fatal_error(NO_HOME_ERROR))
}

/// Install the stderr tracing subscriber. Filter from `SIGCALL_LOG`,
/// default `warn`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
