/// A URL split into the parts the client manipulates.
///
/// `query` and `fragment` exclude their `?` / `#` markers. `Some("")` means
/// the marker is present with nothing after it, which is different from the
/// marker being absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// `scheme://host[:port]`, empty for relative URLs
    pub origin: String,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Location {
    pub fn parse(href: &str) -> Self {
        let (rest, fragment) = match href.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (href, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query.to_string())),
            None => (rest, None),
        };

        let (origin, path) = match rest.find("://") {
            Some(scheme_end) => {
                let after_scheme = scheme_end + 3;
                match rest[after_scheme..].find('/') {
                    Some(slash) => rest.split_at(after_scheme + slash),
                    None => (rest, "/"),
                }
            }
            None => ("", rest),
        };

        Self {
            origin: origin.to_string(),
            path: path.to_string(),
            query,
            fragment,
        }
    }

    pub fn href(&self) -> String {
        let mut href = format!("{}{}", self.origin, self.path);
        if let Some(query) = &self.query {
            href.push('?');
            href.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            href.push('#');
            href.push_str(fragment);
        }
        href
    }

    /// Fragment text, or "" when there is none.
    pub fn fragment_str(&self) -> &str {
        self.fragment.as_deref().unwrap_or("")
    }

    /// Query text, or "" when there is none.
    pub fn query_str(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }
}
