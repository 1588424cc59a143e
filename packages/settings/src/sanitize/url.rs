// ABOUTME: URL rule for stored settings
// ABOUTME: Protocol allow list, scheme defaulting and parser normalization

use url::Url;

/// Schemes a stored URL may use. Anything else is discarded.
pub const ALLOWED_PROTOCOLS: &[&str] = &[
    "http", "https", "ftp", "ftps", "mailto", "news", "irc", "irc6", "ircs", "gopher", "nntp",
    "feed", "telnet", "sms", "tel",
];

fn is_url_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '~'
                | '+'
                | '_'
                | '.'
                | '?'
                | '#'
                | '='
                | '!'
                | '&'
                | ';'
                | ','
                | '/'
                | ':'
                | '%'
                | '@'
                | '$'
                | '|'
                | '*'
                | '\''
                | '('
                | ')'
                | '['
                | ']'
        )
        || !c.is_ascii()
}

/// Split off a leading `scheme:` if the prefix is shaped like one
fn scheme_of(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        Some(scheme)
    } else {
        None
    }
}

/// Normalize a URL for storage. Returns an empty string when the value
/// cannot be made safe. Reachability is never checked.
pub fn sanitize_url(input: &str) -> String {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !c.is_control() && !c.is_whitespace())
        .filter(|c| is_url_char(*c))
        .collect();

    if cleaned.is_empty() {
        return String::new();
    }

    // Relative references stay relative
    if cleaned.starts_with('/') || cleaned.starts_with('#') || cleaned.starts_with('?') {
        return cleaned;
    }

    let candidate = match scheme_of(&cleaned) {
        Some(scheme) => {
            let scheme = scheme.to_ascii_lowercase();
            if !ALLOWED_PROTOCOLS.contains(&scheme.as_str()) {
                return String::new();
            }
            cleaned
        }
        None => format!("http://{}", cleaned),
    };

    match Url::parse(&candidate) {
        // Hierarchical URLs get the parser's canonical form
        Ok(parsed) if parsed.has_authority() => parsed.to_string(),
        Ok(_) => candidate,
        Err(_) => String::new(),
    }
}
