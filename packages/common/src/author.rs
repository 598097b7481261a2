use std::sync::OnceLock;

const UNKNOWN_USER: &str = "Unknown";

static USER_NAME: OnceLock<String> = OnceLock::new();

/// Name of the user recorded as the author of every operation.
///
/// Resolved once per process from `USER` (or `USERNAME` on Windows). A
/// `DOMAIN\user` value is reduced to `user`.
pub fn user_name() -> &'static str {
    USER_NAME.get_or_init(|| {
        let raw = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default();
        normalize_user_name(&raw)
    })
}

fn normalize_user_name(raw: &str) -> String {
    let name = match raw.rfind('\\') {
        Some(pos) => &raw[pos + 1..],
        None => raw,
    };
    let name = name.trim();

    if name.is_empty() {
        UNKNOWN_USER.to_string()
    } else {
        name.to_string()
    }
}
