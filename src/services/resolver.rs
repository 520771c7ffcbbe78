use regex::Regex;
use std::sync::LazyLock;

use crate::models::ResolvedIdentifier;

static STEAM_ID64: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{17}$").unwrap());

static PROFILE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)steamcommunity\.com/(id|profiles)/([a-z0-9_-]+)").unwrap()
});

/// Parses free-form user input into a Steam account reference
///
/// Accepts either a bare 17-digit SteamID64 or anything containing a
/// `steamcommunity.com/id/<slug>` or `steamcommunity.com/profiles/<id>` URL.
/// Pure text parsing; no network access.
pub fn resolve_identifier(raw: &str) -> Option<ResolvedIdentifier> {
    let input = raw.trim();

    if STEAM_ID64.is_match(input) {
        return Some(ResolvedIdentifier::SteamId64(input.to_string()));
    }

    PROFILE_URL
        .captures(input)
        .and_then(|caps| caps.get(2))
        .map(|token| ResolvedIdentifier::ProfileSlug(token.as_str().to_string()))
}
