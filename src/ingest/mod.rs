// src/ingest/mod.rs
pub mod providers;
pub mod types;

use once_cell::sync::OnceCell;
use regex::Regex;

/// Normalize scraped text: decode stray entities, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode (scraper already decodes markup, this catches double-encoded text)
    let out = html_escape::decode_html_entities(s).to_string();

    // 2) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    let mut out = re_ws.replace_all(&out, " ").trim().to_string();

    // 3) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Derive the stable project id from its link.
///
/// `https://freelance.ru/projects/nuzhen-bot-1234567.html` -> `1234567`.
/// Query string and fragment are ignored; when the last path segment yields
/// nothing usable, the whole url is the id.
pub fn project_id_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
    let tail = segment.rsplit('-').next().unwrap_or(segment);
    let id = tail.strip_suffix(".html").unwrap_or(tail);
    if id.is_empty() {
        url.to_string()
    } else {
        id.to_string()
    }
}

/// Join a possibly relative href onto the site base url.
pub fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let base = base.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_collapses_ws() {
        let s = "  Нужен\n\t телеграм&nbsp;бот  ";
        assert_eq!(normalize_text(s), "Нужен телеграм бот");
    }

    #[test]
    fn project_id_is_last_dash_segment() {
        assert_eq!(
            project_id_from_url("https://freelance.ru/projects/nuzhen-telegram-bot-1601234.html"),
            "1601234"
        );
        assert_eq!(project_id_from_url("https://x/123.html"), "123");
        assert_eq!(
            project_id_from_url("https://freelance.ru/projects/bot-77.html?utm=tg#top"),
            "77"
        );
    }

    #[test]
    fn project_id_is_stable_across_calls() {
        let url = "https://freelance.ru/projects/chat-bot-for-shop-42.html";
        assert_eq!(project_id_from_url(url), project_id_from_url(url));
    }

    #[test]
    fn project_id_falls_back_to_url() {
        assert_eq!(project_id_from_url("https://x/p-.html"), "https://x/p-.html");
    }

    #[test]
    fn absolute_url_joins_relative_paths() {
        assert_eq!(
            absolute_url("https://freelance.ru", "/projects/a-1.html"),
            "https://freelance.ru/projects/a-1.html"
        );
        assert_eq!(
            absolute_url("https://freelance.ru/", "projects/a-1.html"),
            "https://freelance.ru/projects/a-1.html"
        );
        assert_eq!(
            absolute_url("https://freelance.ru", "https://other.example/a-2.html"),
            "https://other.example/a-2.html"
        );
    }
}
