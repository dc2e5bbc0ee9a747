//! Placeholder tokens embedded in SMS command templates.
//!
//! A placeholder is a name wrapped in question marks, e.g. `?admin-phone?`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder reserved for the tracker password.
pub const PASSWORD: &str = "password";

/// Text shown instead of the tracker password.
pub const PASSWORD_MASK: &str = "******";

pub(crate) static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?[0-9A-Za-z_-]+\?").expect("Invalid placeholder pattern"));

/// Strip the `?` delimiters from a matched token.
///
/// `?parameter-name?` becomes `parameter-name`; anything not wrapped in
/// question marks is returned untouched.
pub fn parameter_name(token: &str) -> &str {
    if token.len() >= 2 && token.starts_with('?') && token.ends_with('?') {
        &token[1..token.len() - 1]
    } else {
        token
    }
}

/// Wrap a name back into its token form.
pub fn placeholder_token(name: &str) -> String {
    format!("?{}?", name)
}

/// Iterator over the placeholder names of a template, in order of
/// appearance and including repeats.
#[derive(Debug, Clone)]
pub struct Placeholders<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }
        let found = PLACEHOLDER_PATTERN.find_at(self.text, self.pos)?;
        self.pos = found.end();
        Some(parameter_name(found.as_str()))
    }
}

/// Scan `text` for placeholders.
pub fn placeholders(text: &str) -> Placeholders<'_> {
    Placeholders { text, pos: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_password() {
        let names: Vec<_> = placeholders("begin?password?").collect();
        assert_eq!(names, vec!["password"]);
    }

    #[test]
    fn test_order_and_repeats_preserved() {
        let text = "stockade?password? ?longitudeEW?,?latitudeNS?; ?longitudeEW?,?latitudeNS?";
        let names: Vec<_> = placeholders(text).collect();
        assert_eq!(
            names,
            vec!["password", "longitudeEW", "latitudeNS", "longitudeEW", "latitudeNS"]
        );
    }

    #[test]
    fn test_restartable() {
        let text = "adminip?password? ?server-ip? ?server-port?";
        let iter = placeholders(text);
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(first, placeholders(text).collect::<Vec<_>>());
    }

    #[test]
    fn test_malformed_tokens_ignored() {
        assert_eq!(placeholders("no params").count(), 0);
        assert_eq!(placeholders("empty ?? here").count(), 0);
        assert_eq!(placeholders("unterminated ?speed").count(), 0);
        assert_eq!(placeholders("t030s***n?password?").collect::<Vec<_>>(), vec!["password"]);
        assert_eq!(placeholders("what? is this").count(), 0);
    }

    #[test]
    fn test_no_case_normalisation() {
        let names: Vec<_> = placeholders("?Speed? ?speed?").collect();
        assert_eq!(names, vec!["Speed", "speed"]);
    }

    #[test]
    fn test_parameter_name() {
        assert_eq!(parameter_name("?new-password?"), "new-password");
        assert_eq!(parameter_name("plain"), "plain");
        assert_eq!(parameter_name("?"), "?");
        assert_eq!(placeholder_token("speed"), "?speed?");
    }
}
