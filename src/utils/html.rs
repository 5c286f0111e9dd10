// src/utils/html.rs

/// Sanitizes article HTML before it is stored.
///
/// Whitelist based: formatting tags such as `<p>`, `<b>` and `<a>` survive,
/// while `<script>`, `<iframe>`, event handler attributes and `javascript:`
/// links are stripped. Script elements are dropped together with their text.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_and_handlers() {
        let cleaned = clean_html(r#"<p onclick="steal()">Article 21<script>alert(1)</script></p>"#);
        assert_eq!(cleaned, "<p>Article 21</p>");
    }

    #[test]
    fn keeps_basic_formatting() {
        let cleaned = clean_html("<p><b>Right</b> to <i>life</i></p>");
        assert_eq!(cleaned, "<p><b>Right</b> to <i>life</i></p>");
    }
}
