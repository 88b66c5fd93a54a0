use indexmap::IndexMap;
use regex::Regex;

/// Lists the `{name}` placeholders of a URL template in order of first
/// appearance.
///
/// An unterminated `{` ends the scan; everything after it is literal.
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut start = 0;
    while let Some(open) = template[start..].find('{') {
        let open_pos = start + open;
        let Some(close) = template[open_pos..].find('}') else {
            break;
        };
        let close_pos = open_pos + close;
        let name = &template[open_pos + 1..close_pos];
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        start = close_pos + 1;
    }
    names
}

/// Substitutes placeholders with already-encoded values.
///
/// Returns the rendered URL together with the placeholders that had no value;
/// those are left in the URL untouched.
#[must_use]
pub fn substitute_placeholders(
    template: &str,
    values: &IndexMap<String, String>,
) -> (String, Vec<String>) {
    let mut url = template.to_string();
    let mut missing: Vec<String> = Vec::new();
    let mut start = 0;
    while let Some(open) = url[start..].find('{') {
        let open_pos = start + open;
        let Some(close) = url[open_pos..].find('}') else {
            break;
        };
        let close_pos = open_pos + close;
        let name = url[open_pos + 1..close_pos].to_string();

        if let Some(value) = values.get(&name) {
            url.replace_range(open_pos..=close_pos, value);
            start = open_pos + value.len();
        } else {
            if !missing.contains(&name) {
                missing.push(name);
            }
            start = close_pos + 1;
        }
    }
    (url, missing)
}

/// Recovers path parameter values by matching a concrete URL against the
/// template it was rendered from.
///
/// Query strings and fragments are ignored on both sides and the recovered
/// values are percent-decoded. A URL that does not fit the template yields an
/// empty map.
#[must_use]
pub fn extract_path_params(template: &str, url: &str) -> IndexMap<String, String> {
    let template_path = strip_query(template);
    let url_path = strip_query(url);

    let mut pattern = String::from("^");
    let mut names: Vec<String> = Vec::new();
    let mut start = 0;
    while let Some(open) = template_path[start..].find('{') {
        let open_pos = start + open;
        let Some(close) = template_path[open_pos..].find('}') else {
            break;
        };
        let close_pos = open_pos + close;
        pattern.push_str(&regex::escape(&template_path[start..open_pos]));
        pattern.push_str("(.+?)");
        names.push(template_path[open_pos + 1..close_pos].to_string());
        start = close_pos + 1;
    }
    pattern.push_str(&regex::escape(&template_path[start..]));
    pattern.push('$');

    let Ok(regex) = Regex::new(&pattern) else {
        return IndexMap::new();
    };
    let Some(captures) = regex.captures(url_path) else {
        return IndexMap::new();
    };

    let mut values = IndexMap::new();
    for (index, name) in names.into_iter().enumerate() {
        if let Some(matched) = captures.get(index + 1) {
            let decoded = urlencoding::decode(matched.as_str())
                .map_or_else(|_| matched.as_str().to_string(), |s| s.into_owned());
            // First occurrence wins for repeated placeholders
            values.entry(name).or_insert(decoded);
        }
    }
    values
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// True for URLs carrying their own scheme.
#[must_use]
pub fn is_absolute_url(url: &str) -> bool {
    url.contains("://")
}

/// Joins an operation URL onto a base URL. Absolute URLs are returned as is.
#[must_use]
pub fn join_url(base: &str, url: &str) -> String {
    if is_absolute_url(url) || base.is_empty() {
        return url.to_string();
    }
    if url.is_empty() {
        return base.to_string();
    }
    if url.starts_with('?') {
        return format!("{}{url}", base.trim_end_matches('/'));
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_in_order() {
        assert_eq!(
            placeholders("/users/{user_id}/posts/{post_id}?x={user_id}"),
            vec!["user_id", "post_id"]
        );
        assert!(placeholders("/static/path").is_empty());
        assert!(placeholders("/broken/{oops").is_empty());
    }

    #[test]
    fn test_substitute_reports_missing() {
        let mut values = IndexMap::new();
        values.insert("id".to_string(), "42".to_string());
        let (url, missing) = substitute_placeholders("/items/{id}/{slug}", &values);
        assert_eq!(url, "/items/42/{slug}");
        assert_eq!(missing, vec!["slug"]);
    }

    #[test]
    fn test_substituted_value_is_not_rescanned() {
        let mut values = IndexMap::new();
        values.insert("a".to_string(), "{b}".to_string());
        values.insert("b".to_string(), "x".to_string());
        let (url, missing) = substitute_placeholders("/{a}/{b}", &values);
        assert_eq!(url, "/{b}/x");
        assert!(missing.is_empty());
    }

    #[test]
    fn test_extract_path_params() {
        let params = extract_path_params(
            "https://api.test/users/{user}/repos/{repo}",
            "https://api.test/users/octo%20cat/repos/hello?page=2",
        );
        assert_eq!(params.get("user").map(String::as_str), Some("octo cat"));
        assert_eq!(params.get("repo").map(String::as_str), Some("hello"));
    }

    #[test]
    fn test_extract_path_params_spanning_delimiter() {
        let params = extract_path_params("/files/{path}/raw", "/files/a/b/c/raw");
        assert_eq!(params.get("path").map(String::as_str), Some("a/b/c"));
    }

    #[test]
    fn test_extract_path_params_mismatch_is_empty() {
        assert!(extract_path_params("/users/{id}", "/teams/1").is_empty());
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://h/api/", "/users"), "https://h/api/users");
        assert_eq!(join_url("https://h", "https://other/x"), "https://other/x");
        assert_eq!(join_url("", "/users"), "/users");
        assert_eq!(join_url("https://h/api", ""), "https://h/api");
    }
}
