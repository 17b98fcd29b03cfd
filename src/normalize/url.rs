//! URL canonicalization.
//!
//! Two URLs are considered URL-exact when their normalized keys are
//! byte-equal. The empty string never matches anything.

/// Produces the canonical key for a URL, or `None` when nothing remains
/// after normalization.
///
/// 1. Lowercase the entire URL.
/// 2. Strip the scheme and a leading `www.`.
/// 3. Rewrite recognized YouTube video links to `youtube.com/watch?v=<id>`.
/// 4. Drop query string and fragment, strip the trailing `/`.
pub fn normalize_url(url: &str) -> Option<String> {
    let url = url.trim().to_lowercase();
    if url.is_empty() {
        return None;
    }

    let mut rest = url.as_str();
    for scheme in ["https://", "http://"] {
        if let Some(stripped) = rest.strip_prefix(scheme) {
            rest = stripped;
            break;
        }
    }
    rest = rest.strip_prefix("www.").unwrap_or(rest);

    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    if host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com") {
        if let Some(canonical) = normalize_youtube(rest, host) {
            return Some(canonical);
        }
    }

    let rest = rest.split(['?', '#']).next().unwrap_or("");
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Rewrites the video-link formats (`youtu.be/<id>`, `watch?v=<id>`,
/// `embed/<id>`, `shorts/<id>`, `v/<id>`, `live/<id>`) to the canonical
/// watch form. Non-video YouTube paths fall through to generic handling.
fn normalize_youtube(rest: &str, host: &str) -> Option<String> {
    let after_host = &rest[host.len()..];
    let path = after_host.split(['?', '#']).next().unwrap_or("");
    let query = after_host
        .split_once('?')
        .map(|(_, q)| q.split('#').next().unwrap_or(""))
        .unwrap_or("");

    let video_id = if host == "youtu.be" {
        path.trim_matches('/').split('/').next().map(str::to_string)
    } else if path.starts_with("/watch") {
        query_param(query, "v")
    } else {
        ["/embed/", "/v/", "/shorts/", "/live/"]
            .iter()
            .find_map(|prefix| {
                path.strip_prefix(prefix)
                    .map(|tail| tail.split('/').next().unwrap_or("").to_string())
            })
    };

    match video_id {
        Some(id) if is_video_id(&id) => Some(format!("youtube.com/watch?v={}", id)),
        _ => None,
    }
}

// YouTube video ids are 11 characters of [A-Za-z0-9_-]; the input is already
// lowercased at this point.
fn is_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}
