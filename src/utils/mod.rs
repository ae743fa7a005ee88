pub mod logging;

use chrono::Local;

/// Local wall-clock stamp used at the top of every notification,
/// e.g. `2026-10-18 Sun 09:41:07`.
pub fn now_stamp() -> String {
    Local::now().format("%Y-%m-%d %a %H:%M:%S").to_string()
}
