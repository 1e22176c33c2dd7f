//! Input Sanitization
//!
//! Every cleaner here is total and idempotent: running it on its own output
//! changes nothing.

/// Upper bound applied to admin free-text fields.
pub const ADMIN_INPUT_LIMIT: usize = 5000;

/// Upper bound applied to URLs after cleaning.
pub const URL_MAX_LENGTH: usize = 2048;

const STRIPPED_INPUT_CHARS: &[char] = &['<', '>', '"', '/', '\\', '&'];
const STRIPPED_FAQ_CHARS: &[char] = &['<', '>', '"', '/', '\\'];
const URL_SCHEME_TOKENS: &[&str] = &["javascript:", "data:", "vbscript:"];

/// Collapse whitespace runs into single spaces and drop the ends.
fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

fn strip_chars(value: &str, stripped: &[char]) -> String {
    value.chars().filter(|c| !stripped.contains(c)).collect()
}

/// Clean free text: drop markup-significant characters, normalize
/// whitespace and cap the length at `max_len` characters when given.
pub fn sanitize_input(input: &str, max_len: Option<usize>) -> String {
    let cleaned = collapse_whitespace(&strip_chars(input, STRIPPED_INPUT_CHARS));
    match max_len {
        Some(max) => truncate_chars(&cleaned, max).trim_end().to_string(),
        None => cleaned,
    }
}

/// Clean an email address: lowercase, keep `[a-z0-9@._-]` only.
pub fn sanitize_email(email: &str) -> String {
    email
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-'))
        .collect()
}

/// Clean a phone number down to digits, `+`, `-`, spaces and parentheses.
pub fn sanitize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn has_http_scheme(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn remove_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<String> {
    let lower = haystack.to_ascii_lowercase();
    let idx = lower.find(needle)?;
    let mut out = String::with_capacity(haystack.len());
    out.push_str(&haystack[..idx]);
    out.push_str(&haystack[idx + needle.len()..]);
    Some(out)
}

/// Clean a URL.
///
/// Anything that does not start with `http://` or `https://` is rejected
/// outright and comes back empty; script-capable scheme tokens are removed
/// from the rest.
pub fn sanitize_url(url: &str) -> String {
    let trimmed = url.trim();
    if !has_http_scheme(trimmed) {
        return String::new();
    }

    let mut cleaned = trimmed.to_string();
    // Removing one token can splice together another, so loop to a fixpoint.
    loop {
        let mut changed = false;
        for token in URL_SCHEME_TOKENS {
            while let Some(next) = remove_ascii_case_insensitive(&cleaned, token) {
                cleaned = next;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let cleaned = truncate_chars(cleaned.trim_end(), URL_MAX_LENGTH);
    // The scheme may have been spliced away ("http://" + "data:" tricks).
    if has_http_scheme(&cleaned) {
        cleaned.trim_end().to_string()
    } else {
        String::new()
    }
}

/// Clean an FAQ question; a trailing run of `?` becomes a single `?`.
pub fn sanitize_faq_question(question: &str) -> String {
    let cleaned = collapse_whitespace(&strip_chars(question, STRIPPED_FAQ_CHARS));
    let body = cleaned.trim_end_matches('?');
    if body.len() == cleaned.len() {
        cleaned
    } else {
        format!("{body}?")
    }
}

pub fn sanitize_faq_answer(answer: &str) -> String {
    collapse_whitespace(&strip_chars(answer, STRIPPED_FAQ_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_strips_and_collapses() {
        assert_eq!(
            sanitize_input("  <b>Hello</b>   \"world\" & co\\  ", None),
            "bHellob world co"
        );
        assert_eq!(sanitize_input("a < b", None), "a b");
        assert_eq!(sanitize_input("line\n\n\tbreak", None), "line break");
    }

    #[test]
    fn input_truncates_without_trailing_space() {
        assert_eq!(sanitize_input("abc def", Some(4)), "abc");
        let long = "x".repeat(6000);
        assert_eq!(
            sanitize_input(&long, Some(ADMIN_INPUT_LIMIT)).chars().count(),
            ADMIN_INPUT_LIMIT
        );
    }

    #[test]
    fn input_truncation_respects_char_boundaries() {
        assert_eq!(sanitize_input("ééééé", Some(2)), "éé");
    }

    #[test]
    fn email_lowercases_and_filters() {
        assert_eq!(sanitize_email("  John.Doe+spam@Example.COM "), "john.doespam@example.com");
        assert_eq!(sanitize_email("<script>@x.y"), "script@x.y");
    }

    #[test]
    fn phone_keeps_dialling_characters() {
        assert_eq!(sanitize_phone(" +94 (77) 123-4567 ext"), "+94 (77) 123-4567");
        assert_eq!(sanitize_phone("1 a"), "1");
    }

    #[test]
    fn url_requires_http_scheme() {
        assert_eq!(sanitize_url("javascript:alert(1)"), "");
        assert_eq!(sanitize_url("ftp://example.com"), "");
        assert_eq!(sanitize_url("  HTTPS://Example.com/x  "), "HTTPS://Example.com/x");
    }

    #[test]
    fn url_removes_script_tokens() {
        assert_eq!(
            sanitize_url("https://example.com/?next=JavaScript:alert(1)"),
            "https://example.com/?next=alert(1)"
        );
        assert_eq!(
            sanitize_url("https://example.com/datdata:a:x"),
            "https://example.com/x"
        );
    }

    #[test]
    fn url_is_capped() {
        let url = format!("https://example.com/{}", "a".repeat(3000));
        assert_eq!(sanitize_url(&url).chars().count(), URL_MAX_LENGTH);
    }

    #[test]
    fn faq_question_collapses_question_marks() {
        assert_eq!(
            sanitize_faq_question("  What is   the warranty??? "),
            "What is the warranty?"
        );
        assert_eq!(sanitize_faq_question("No mark"), "No mark");
        assert_eq!(sanitize_faq_answer("Keep & this </b>"), "Keep & this b");
    }
}
