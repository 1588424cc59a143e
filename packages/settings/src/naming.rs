// ABOUTME: Naming convention converters and priority helpers
// ABOUTME: Used to derive slugs, token actions and menu ordering from option names

/// Lowest priority an admin screen entry can take
pub const MIN_PRIORITY: i32 = 0;
pub const MAX_PRIORITY: i32 = 1000;
pub const DEFAULT_PRIORITY: i32 = 10;

/// Split an identifier into lowercase words.
///
/// Word boundaries are separators (`_`, `-`, whitespace, `.`) and case changes,
/// so `"siteTitle"`, `"site_title"` and `"Site Title"` all give `["site", "title"]`.
fn words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = input.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // "siteTitle" splits before T, "HTTPServer" splits before S
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn to_snake_case(input: &str) -> String {
    words(input).join("_")
}

pub fn to_kebab_case(input: &str) -> String {
    words(input).join("-")
}

pub fn to_pascal_case(input: &str) -> String {
    words(input).iter().map(|w| capitalize(w)).collect()
}

pub fn to_camel_case(input: &str) -> String {
    let words = words(input);
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

pub fn to_title_case(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| capitalize(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clamp a priority into the supported range
pub fn normalize_priority(priority: i32) -> i32 {
    priority.clamp(MIN_PRIORITY, MAX_PRIORITY)
}

/// Priority that sorts just before `priority`
pub fn priority_before(priority: i32) -> i32 {
    normalize_priority(priority.saturating_sub(1))
}

/// Priority that sorts just after `priority`
pub fn priority_after(priority: i32) -> i32 {
    normalize_priority(priority.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("keel_settings", "keel_settings", "keel-settings", "keelSettings", "KeelSettings", "Keel Settings")]
    #[case("siteTitle", "site_title", "site-title", "siteTitle", "SiteTitle", "Site Title")]
    #[case("HTTPServer port", "http_server_port", "http-server-port", "httpServerPort", "HttpServerPort", "Http Server Port")]
    #[case("  --Admin.Menu--  ", "admin_menu", "admin-menu", "adminMenu", "AdminMenu", "Admin Menu")]
    #[case("v2Api", "v2_api", "v2-api", "v2Api", "V2Api", "V2 Api")]
    #[case("", "", "", "", "", "")]
    fn test_case_conversions(
        #[case] input: &str,
        #[case] snake: &str,
        #[case] kebab: &str,
        #[case] camel: &str,
        #[case] pascal: &str,
        #[case] title: &str,
    ) {
        assert_eq!(to_snake_case(input), snake);
        assert_eq!(to_kebab_case(input), kebab);
        assert_eq!(to_camel_case(input), camel);
        assert_eq!(to_pascal_case(input), pascal);
        assert_eq!(to_title_case(input), title);
    }

    #[test]
    fn test_priority_helpers() {
        assert_eq!(normalize_priority(-5), MIN_PRIORITY);
        assert_eq!(normalize_priority(5000), MAX_PRIORITY);
        assert_eq!(normalize_priority(DEFAULT_PRIORITY), 10);

        assert_eq!(priority_before(10), 9);
        assert_eq!(priority_after(10), 11);
        assert_eq!(priority_before(MIN_PRIORITY), MIN_PRIORITY);
        assert_eq!(priority_after(MAX_PRIORITY), MAX_PRIORITY);
        assert_eq!(priority_after(i32::MAX), MAX_PRIORITY);
        assert_eq!(priority_before(i32::MIN), MIN_PRIORITY);
    }
}
