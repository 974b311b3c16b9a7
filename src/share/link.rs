//! Share link helpers.

use url::Url;

/// Query parameter carrying the share token.
pub const SHARE_PARAM: &str = "mix";

/// Query pairs of `url` other than the share parameter, in order.
fn other_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .filter(|(key, _)| key != SHARE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Replaces the query of `url` with `pairs`, dropping the `?` when empty.
fn set_pairs(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

/// Builds a share link for `token` on top of `base`.
///
/// Other query parameters and the fragment of `base` are kept. A share
/// token already present in `base` is replaced.
///
/// # Errors
///
/// Returns an error if `base` is not an absolute URL.
pub fn share_url(base: &str, token: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    let mut pairs = other_pairs(&url);
    pairs.push((SHARE_PARAM.to_string(), token.to_string()));
    set_pairs(&mut url, &pairs);
    Ok(url.into())
}

/// Extracts the share token from a link, if it carries one.
pub fn token_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == SHARE_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Removes the share parameter from a link, keeping everything else.
///
/// Input that does not parse as a URL is returned unchanged.
pub fn strip_token(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let pairs = other_pairs(&parsed);
    set_pairs(&mut parsed, &pairs);
    parsed.into()
}
