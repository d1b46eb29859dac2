/*!
 * Sheet locator parsing.
 *
 * Accepted forms:
 * - a Google Sheets URL, e.g. `https://docs.google.com/spreadsheets/d/<id>/edit#gid=<gid>`
 * - a bare Google document id
 * - a path to a local `*.json` workbook, optionally suffixed with `#gid=<gid>`
 *
 * Without a gid every sheet of the document is translated.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use super::SheetId;
use crate::errors::LocatorError;

static DOCUMENT_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/d/([^/?#]+)").expect("valid regex"));
static GID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"gid=([^#&]+)").expect("valid regex"));
static BARE_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{10,}$").expect("valid regex"));

/// Where the sheets to translate live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetLocator {
    /// A Google Sheets document
    Google { document_id: String, gid: Option<SheetId> },

    /// A local JSON workbook
    Local { path: PathBuf, gid: Option<SheetId> },
}

fn parse_gid(text: &str) -> Result<Option<SheetId>, LocatorError> {
    match GID_REGEX.captures(text) {
        Some(caps) => caps[1]
            .parse::<SheetId>()
            .map(Some)
            .map_err(|_| LocatorError(format!("gid '{}' is not a number", &caps[1]))),
        None => Ok(None),
    }
}

impl SheetLocator {
    /// The sheet explicitly selected, if any
    pub fn gid(&self) -> Option<SheetId> {
        match self {
            SheetLocator::Google { gid, .. } | SheetLocator::Local { gid, .. } => *gid,
        }
    }
}

impl FromStr for SheetLocator {
    type Err = LocatorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(LocatorError("empty locator".to_string()));
        }

        if let Ok(url) = Url::parse(input) {
            if matches!(url.scheme(), "http" | "https") {
                let document_id = DOCUMENT_ID_REGEX
                    .captures(url.path())
                    .map(|caps| caps[1].to_string())
                    .ok_or_else(|| LocatorError(format!("no document id in '{}'", input)))?;

                // gid may sit in the fragment or in the query string
                let gid = match url.fragment() {
                    Some(fragment) => parse_gid(fragment)?,
                    None => None,
                };
                let gid = match (gid, url.query()) {
                    (None, Some(query)) => parse_gid(query)?,
                    (gid, _) => gid,
                };

                return Ok(SheetLocator::Google { document_id, gid });
            }
        }

        let (path_part, fragment) = match input.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (input, None),
        };

        if path_part.to_ascii_lowercase().ends_with(".json") {
            let gid = match fragment {
                Some(fragment) => parse_gid(fragment)?,
                None => None,
            };
            return Ok(SheetLocator::Local {
                path: PathBuf::from(path_part),
                gid,
            });
        }

        if BARE_ID_REGEX.is_match(input) {
            return Ok(SheetLocator::Google {
                document_id: input.to_string(),
                gid: None,
            });
        }

        Err(LocatorError(format!(
            "'{}' is neither a Google Sheets URL, a document id nor a .json workbook",
            input
        )))
    }
}

impl fmt::Display for SheetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetLocator::Google { document_id, gid: Some(gid) } => write!(f, "{}#gid={}", document_id, gid),
            SheetLocator::Google { document_id, gid: None } => write!(f, "{}", document_id),
            SheetLocator::Local { path, gid: Some(gid) } => write!(f, "{}#gid={}", path.display(), gid),
            SheetLocator::Local { path, gid: None } => write!(f, "{}", path.display()),
        }
    }
}
