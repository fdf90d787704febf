//! Action registry
//!
//! The closed set of operations the dispatch protocol understands, and the HTTP
//! method each one travels as.

use crate::codec::Namespace;
use crate::error::Error;
use reqwest::Method;
use std::fmt;
use std::str::FromStr;

/// A dispatchable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    List,
    Count,
    Cancel,
    Apply,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::List,
        Action::Count,
        Action::Cancel,
        Action::Apply,
    ];

    /// HTTP method for this action.
    pub fn method(self) -> Method {
        match self {
            Action::Create | Action::Cancel => Method::POST,
            Action::Read | Action::List | Action::Count => Method::GET,
            Action::Update => Method::PATCH,
            Action::Delete => Method::DELETE,
            Action::Apply => Method::PUT,
        }
    }

    /// Tag namespace used to encode a request body, if the action carries one.
    pub fn body_namespace(self) -> Option<Namespace> {
        match self {
            Action::Create => Some(Namespace::Create),
            Action::Update => Some(Namespace::Update),
            Action::Apply => Some(Namespace::Apply),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::List => "list",
            Action::Count => "count",
            Action::Cancel => "cancel",
            Action::Apply => "apply",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}

/// Resolved method and path for one action on one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
}

impl Route {
    /// Route using the action's registered method.
    pub fn new(action: Action, path: impl Into<String>) -> Self {
        Self {
            method: action.method(),
            path: path.into(),
        }
    }

    /// Route with an explicit method, for endpoints that deviate from the registry.
    pub fn with_method(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// Percent-encode one path segment.
pub fn segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_has_one_method() {
        for action in Action::ALL {
            let method = action.method();
            assert!(!method.as_str().is_empty(), "{} has no method", action);
        }
        assert_eq!(Action::Update.method(), Method::PATCH);
        assert_eq!(Action::Count.method(), Method::GET);
    }

    #[test]
    fn test_only_writes_carry_bodies() {
        let with_body: Vec<_> = Action::ALL
            .into_iter()
            .filter(|a| a.body_namespace().is_some())
            .collect();
        assert_eq!(with_body, vec![Action::Create, Action::Update, Action::Apply]);
    }

    #[test]
    fn test_parse_action_names() {
        assert_eq!("LIST".parse::<Action>().unwrap(), Action::List);
        assert_eq!(Action::Cancel.to_string(), "cancel");
        assert!("restart".parse::<Action>().is_err());
    }

    #[test]
    fn test_segment_escapes_slashes() {
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
