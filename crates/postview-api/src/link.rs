// ── Link header pagination ──
//
// Collection responses advertise neighbouring pages as
// `<url>; rel="next", <url>; rel="last"`. Only well-formed entries are
// kept; anything unparsable is skipped, so a broken header reads the
// same as a missing one (terminal page).

use std::collections::HashMap;

use tracing::debug;
use url::Url;

/// Relations parsed from a `Link` response header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    relations: HashMap<String, Url>,
}

impl PageLinks {
    /// Parse a raw `Link` header value.
    ///
    /// Relative targets are resolved against `request_url`. Every target is
    /// rewritten to `scheme`: the placeholder API advertises `http://` links
    /// even when served over TLS, and following them would downgrade the
    /// connection.
    pub fn parse(header: Option<&str>, request_url: &Url, scheme: &str) -> Self {
        let mut relations = HashMap::new();
        let Some(header) = header else {
            return Self { relations };
        };

        for entry in split_entries(header) {
            let Some((target, params)) = split_entry(entry) else {
                debug!(entry, "skipping malformed link entry");
                continue;
            };
            let Some(rels) = rel_param(params) else {
                continue;
            };

            let mut url = match request_url.join(target) {
                Ok(url) => url,
                Err(e) => {
                    debug!(target, error = %e, "skipping unparsable link target");
                    continue;
                }
            };
            if url.scheme() != scheme && url.set_scheme(scheme).is_err() {
                debug!(%url, scheme, "could not force link scheme");
            }

            for rel in rels.split_whitespace() {
                relations.insert(rel.to_ascii_lowercase(), url.clone());
            }
        }

        Self { relations }
    }

    /// The `rel="next"` target, or `None` on the last page.
    pub fn next(&self) -> Option<&Url> {
        self.get("next")
    }

    pub fn get(&self, rel: &str) -> Option<&Url> {
        self.relations.get(rel)
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }
}

/// Split a header into its comma-separated entries. Commas inside `<...>`
/// targets or quoted parameter values belong to the entry.
fn split_entries(header: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut in_target = false;
    let mut in_quotes = false;

    for (i, c) in header.char_indices() {
        match c {
            '<' if !in_quotes => in_target = true,
            '>' if !in_quotes => in_target = false,
            '"' if !in_target => in_quotes = !in_quotes,
            ',' if !in_target && !in_quotes => {
                entries.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&header[start..]);
    entries
}

/// Split `<target>; params` into its two halves.
fn split_entry(entry: &str) -> Option<(&str, &str)> {
    let rest = entry.trim().strip_prefix('<')?;
    let (target, params) = rest.split_once('>')?;
    Some((target.trim(), params))
}

/// Extract the (unquoted) value of the `rel` parameter.
fn rel_param(params: &str) -> Option<&str> {
    params.split(';').find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("rel")
            .then(|| value.trim().trim_matches('"'))
    })
}
