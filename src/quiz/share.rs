use urlencoding::encode;

use crate::quiz::content::{fill, Strings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub text: String,
    pub url: String,
    pub telegram: String,
    pub whatsapp: String,
    pub x: String,
}

/// Build share links for a composed result title.
pub fn share_payload(strings: &Strings, title: &str, quiz_url: &str) -> SharePayload {
    let text = fill(&strings.share_text, &[("title", title), ("url", quiz_url)]);
    SharePayload {
        telegram: format!(
            "https://t.me/share/url?url={}&text={}",
            encode(quiz_url),
            encode(&text)
        ),
        whatsapp: format!("https://wa.me/?text={}", encode(&text)),
        x: format!(
            "https://twitter.com/intent/tweet?text={}&url={}",
            encode(&text),
            encode(quiz_url)
        ),
        url: quiz_url.to_string(),
        text,
    }
}
