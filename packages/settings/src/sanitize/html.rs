// ABOUTME: Markup stripping for text and post-content sanitization
// ABOUTME: Plain-text collapse and an allow-listed HTML subset for rich content

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::url::sanitize_url;

/// Elements removed together with everything inside them
static DANGEROUS_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<(script|style|iframe|object|embed|noscript|template)\b[^>]*>.*?</(script|style|iframe|object|embed|noscript|template)\s*>",
    )
    .expect("valid dangerous block regex")
});

static SCRIPT_STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>")
        .expect("valid script/style regex")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

/// Anything shaped like a tag: `<` followed by a name, `/` or `!`
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[/!]?[a-zA-Z!][^<>]*>").expect("valid tag regex"));

static ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)([^<>]*)>").expect("valid element regex")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#,
    )
    .expect("valid attribute regex")
});

static PERCENT_OCTET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[a-fA-F0-9]{2}").expect("valid octet regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "code", "del", "em", "h1", "h2", "h3", "h4", "h5",
    "h6", "hr", "i", "img", "ins", "li", "ol", "p", "pre", "q", "s", "span", "strong", "sub",
    "sup", "table", "tbody", "td", "th", "thead", "tr", "u", "ul",
];

const GLOBAL_ATTRIBUTES: &[&str] = &["class", "title"];

const URL_ATTRIBUTES: &[&str] = &["href", "src", "cite"];

fn tag_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href", "rel", "target"],
        "img" => &["src", "alt", "width", "height"],
        "blockquote" | "q" => &["cite"],
        "td" | "th" => &["colspan", "rowspan"],
        _ => &[],
    }
}

/// Apply `f` until it stops changing the input. `f` must only ever delete
/// text, so every pass that changes something makes the string shorter.
fn repeat_until_stable(input: String, f: impl Fn(&str) -> String) -> String {
    let mut current = input;
    loop {
        let next = f(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Plain-text rule: no tags, no control characters, single-spaced, trimmed.
///
/// The output is a fixed point: `sanitize_text(&sanitize_text(x)) == sanitize_text(x)`.
pub fn sanitize_text(input: &str) -> String {
    let stripped = repeat_until_stable(input.to_string(), |s| {
        let s = SCRIPT_STYLE_BLOCK.replace_all(s, "");
        ANY_TAG.replace_all(&s, "").into_owned()
    });

    // Whatever '<' survived is not a tag
    let escaped = stripped.replace('<', "&lt;");

    // Controls go before octets so a removed control cannot join a new `%XX`
    let no_controls: String = escaped
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect();

    let no_octets =
        repeat_until_stable(no_controls, |s| PERCENT_OCTET.replace_all(s, "").into_owned());

    WHITESPACE_RUN
        .replace_all(&no_octets, " ")
        .trim()
        .to_string()
}

/// Rich-content rule: keep an allow-listed subset of HTML and attributes.
pub fn sanitize_post_content(input: &str) -> String {
    let without_comments = COMMENT.replace_all(input, "");
    let without_blocks = repeat_until_stable(without_comments.into_owned(), |s| {
        DANGEROUS_BLOCK.replace_all(s, "").into_owned()
    });
    let cleaned: String = without_blocks.chars().filter(|c| *c != '\0').collect();

    let mut output = String::with_capacity(cleaned.len());
    let mut last = 0;
    for caps in ELEMENT.captures_iter(&cleaned) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        output.push_str(&escape_text(&cleaned[last..whole.start()]));
        output.push_str(&rebuild_element(&caps));
        last = whole.end();
    }
    output.push_str(&escape_text(&cleaned[last..]));
    output
}

fn escape_text(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn rebuild_element(caps: &Captures<'_>) -> String {
    let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
    let name = caps
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();

    if !ALLOWED_TAGS.contains(&name.as_str()) {
        return String::new();
    }

    if closing {
        return format!("</{}>", name);
    }

    let raw_attributes = caps.get(3).map(|m| m.as_str()).unwrap_or("");
    let mut rebuilt = format!("<{}", name);

    for attr in ATTRIBUTE.captures_iter(raw_attributes) {
        let attr_name = attr
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();

        // Event handlers never survive, even if someone adds them to a list
        if attr_name.starts_with("on") {
            continue;
        }
        if !GLOBAL_ATTRIBUTES.contains(&attr_name.as_str())
            && !tag_attributes(&name).contains(&attr_name.as_str())
        {
            continue;
        }

        let value = attr
            .get(2)
            .or_else(|| attr.get(3))
            .or_else(|| attr.get(4))
            .map(|m| m.as_str())
            .unwrap_or("");

        let value = if URL_ATTRIBUTES.contains(&attr_name.as_str()) {
            let url = sanitize_url(value);
            if url.is_empty() {
                continue;
            }
            url
        } else {
            value.to_string()
        };

        rebuilt.push_str(&format!(" {}=\"{}\"", attr_name, escape_attribute(&value)));
    }

    if raw_attributes.trim_end().ends_with('/') {
        rebuilt.push_str(" /");
    }
    rebuilt.push('>');
    rebuilt
}
