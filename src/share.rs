// 🔗 URL sharing - configuration as form-encoded JSON in a query parameter

use crate::config::Configuration;
use crate::error::{Result, TimelineError};
use url::Url;

/// Query parameter holding the encoded configuration.
pub const SHARE_PARAM: &str = "config";

/// Base used to resolve bare query strings such as `?config=...`.
const LOCAL_BASE: &str = "http://localhost/";

/// `base?config=...`, keeping other query parameters and dropping any fragment.
pub fn share_url(base: &str, config: &Configuration) -> Result<String> {
    let mut url = Url::parse(base).map_err(url_error)?;
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| *key != SHARE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let json = config.to_json()?;
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(SHARE_PARAM, &json);

    Ok(url.into())
}

/// Read the `config` parameter from a share URL, or from its query string
/// alone (with or without the leading `?`).
///
/// Returns `Ok(None)` when the parameter is absent.
pub fn config_from_query(input: &str) -> Result<Option<Configuration>> {
    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let query = input.strip_prefix('?').unwrap_or(input);
            Url::parse(LOCAL_BASE)
                .and_then(|base| base.join(&format!("?{}", query)))
                .map_err(url_error)?
        }
        Err(e) => return Err(url_error(e)),
    };

    let json = url
        .query_pairs()
        .find(|(key, _)| *key == SHARE_PARAM)
        .map(|(_, value)| value.into_owned());

    match json {
        Some(json) => {
            log::debug!("loading configuration from {} byte query value", json.len());
            Configuration::from_json(&json).map(Some)
        }
        None => Ok(None),
    }
}

fn url_error(e: url::ParseError) -> TimelineError {
    TimelineError::Parse {
        format: "URL",
        message: e.to_string(),
    }
}
