use crate::platform;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Poll `path` until it can be opened exclusively, at most `attempts` times
/// with `interval` between tries. The handle is closed straight away.
///
/// Returns `false` on timeout. Callers carry on with the file regardless;
/// a file that is still locked surfaces later as a retryable strip failure.
pub fn wait_ready(path: &Path, attempts: u32, interval: Duration) -> bool {
    for attempt in 1..=attempts {
        match platform::open_exclusive(path) {
            Ok(file) => {
                drop(file);
                debug!("{} ready after {} attempt(s)", path.display(), attempt);
                return true;
            }
            Err(e) => {
                debug!("{} not ready ({}): {}", path.display(), attempt, e);
                if attempt < attempts {
                    thread::sleep(interval);
                }
            }
        }
    }

    warn!(
        "File {} was not ready after {} attempt(s)",
        path.display(),
        attempts
    );
    false
}
