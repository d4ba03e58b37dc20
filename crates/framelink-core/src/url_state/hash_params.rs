//! Parameters carried in the URL fragment (`#key=value&other=x`).
//!
//! A fragment starting with `/` is a client route (`#/photos/1`), not a
//! parameter bag: reads report nothing and writes leave it untouched.

use std::sync::Arc;

use tracing::debug;

use super::{Location, ParamBag, UrlCell};

const ROUTE_PREFIX: char = '/';

#[derive(Clone)]
pub struct HashParams {
    cell: Arc<dyn UrlCell>,
}

impl HashParams {
    pub fn new(cell: Arc<dyn UrlCell>) -> Self {
        Self { cell }
    }

    /// Value of `key`, or `None` when the fragment is absent, route-shaped,
    /// or lacks the key.
    pub fn get(&self, key: &str) -> Option<String> {
        let location = self.cell.location();
        let bag = parameter_bag(&location)?;
        bag.get(key).map(str::to_string)
    }

    /// Write `key`, keeping every other parameter as it was.
    pub fn set(&self, key: &str, value: &str) {
        let location = self.cell.location();
        let Some(mut bag) = parameter_bag(&location) else {
            debug!(key, "Fragment is a route; not setting hash parameter");
            return;
        };
        bag.set(key, value);
        self.cell.set_fragment(&bag.serialize());
    }

    /// Delete `key`. When no parameters remain the fragment is removed
    /// entirely rather than left as a bare `#`.
    pub fn remove(&self, key: &str) {
        let mut location = self.cell.location();
        let Some(mut bag) = parameter_bag(&location) else {
            debug!(key, "Fragment is a route; not removing hash parameter");
            return;
        };
        bag.remove(key);
        if bag.is_empty() {
            location.fragment = None;
            self.cell.replace(location);
        } else {
            self.cell.set_fragment(&bag.serialize());
        }
    }

    /// Drop the fragment whatever it contains, routes included.
    pub fn clear_all(&self) {
        let mut location = self.cell.location();
        location.fragment = None;
        self.cell.replace(location);
    }

    /// Link to `origin` whose fragment carries `key=value`.
    pub fn compose_link(origin: &str, key: &str, value: &str) -> String {
        let mut bag = ParamBag::default();
        bag.set(key, value);
        format!("{}/#{}", origin.trim_end_matches('/'), bag.serialize())
    }
}

fn parameter_bag(location: &Location) -> Option<ParamBag> {
    let fragment = location.fragment_str();
    if fragment.starts_with(ROUTE_PREFIX) {
        return None;
    }
    Some(ParamBag::parse(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url_state::MemoryUrl;

    fn params_for(href: &str) -> (Arc<MemoryUrl>, HashParams) {
        let cell = Arc::new(MemoryUrl::new(href));
        let params = HashParams::new(cell.clone());
        (cell, params)
    }

    #[test]
    fn get_reads_fragment_parameter() {
        let (_, params) = params_for("https://g.example.com/#s=abc123");
        assert_eq!(params.get("s").as_deref(), Some("abc123"));
        assert_eq!(params.get("other"), None);
    }

    #[test]
    fn get_without_fragment_is_none() {
        let (_, params) = params_for("https://g.example.com/");
        assert_eq!(params.get("s"), None);
    }

    #[test]
    fn set_then_get_with_other_encoded_key_present() {
        let (cell, params) = params_for("https://g.example.com/#foo=bar%20baz");
        params.set("s", "XYZ9");
        assert_eq!(params.get("s").as_deref(), Some("XYZ9"));
        assert_eq!(params.get("foo").as_deref(), Some("bar baz"));
        assert_eq!(cell.href(), "https://g.example.com/#foo=bar%20baz&s=XYZ9");
    }

    #[test]
    fn set_twice_does_not_clobber_first_key() {
        let (_, params) = params_for("https://g.example.com/");
        params.set("a", "1");
        params.set("b", "2");
        assert_eq!(params.get("a").as_deref(), Some("1"));
        assert_eq!(params.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn values_with_reserved_characters_round_trip() {
        let (_, params) = params_for("https://g.example.com/");
        params.set("q", "a&b=c d");
        assert_eq!(params.get("q").as_deref(), Some("a&b=c d"));
    }

    #[test]
    fn remove_after_set_preserves_other_keys() {
        let (_, params) = params_for("https://g.example.com/#keep=1&also=two+words");
        params.set("s", "abc");
        params.remove("s");
        assert_eq!(params.get("s"), None);
        assert_eq!(params.get("keep").as_deref(), Some("1"));
        assert_eq!(params.get("also").as_deref(), Some("two words"));
    }

    #[test]
    fn removing_last_parameter_clears_fragment_entirely() {
        let (cell, params) = params_for("https://g.example.com/gallery?x=1#s=abc");
        params.remove("s");
        assert_eq!(cell.href(), "https://g.example.com/gallery?x=1");
        assert_eq!(cell.location().fragment, None);
    }

    #[test]
    fn route_shaped_fragment_is_left_alone() {
        let (cell, params) = params_for("https://g.example.com/#/photos/s=1");
        let before = cell.href();
        assert_eq!(params.get("s"), None);
        params.set("s", "abc");
        assert_eq!(cell.href(), before);
        params.remove("s");
        assert_eq!(cell.href(), before);
    }

    #[test]
    fn clear_all_removes_route_fragment_too() {
        let (cell, params) = params_for("https://g.example.com/p?q=1#/photos");
        params.clear_all();
        assert_eq!(cell.href(), "https://g.example.com/p?q=1");
    }

    #[test]
    fn compose_link_builds_share_url() {
        assert_eq!(
            HashParams::compose_link("https://g.example.com/", "s", "abc123"),
            "https://g.example.com/#s=abc123"
        );
    }
}
