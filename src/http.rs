//! Helpers shared by the HTTP provider clients.

/// Attach `Authorization: Bearer …` only when a non-empty key is set.
///
/// Local servers (Ollama, GPT4All) run without a key; an empty string in
/// `settings.toml` means the same as no key at all.
pub(crate) fn authorize(
    req: reqwest::RequestBuilder,
    api_key: Option<&str>,
) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) if !key.is_empty() => req.bearer_auth(key),
        _ => req,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    fn auth_header(api_key: Option<&str>) -> Option<String> {
        let req = authorize(reqwest::Client::new().get("http://127.0.0.1/"), api_key)
            .build()
            .unwrap();
        req.headers()
            .get(AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn key_is_sent_as_bearer() {
        assert_eq!(auth_header(Some("sk-test")).as_deref(), Some("Bearer sk-test"));
    }

    #[test]
    fn missing_or_empty_key_sends_nothing() {
        assert_eq!(auth_header(None), None);
        assert_eq!(auth_header(Some("")), None);
    }
}
