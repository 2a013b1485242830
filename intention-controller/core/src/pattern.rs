use crate::WILDCARD;
use std::fmt;

/// A single namespace or name component of a [`ServicePattern`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Component<'a> {
    /// Matches any value.
    Wildcard,

    /// Matches exactly one value.
    Exact(&'a str),
}

/// Identifies one end of an intention: a namespace and a service name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServicePattern<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
}

// === impl Component ===

impl<'a> Component<'a> {
    pub fn new(value: &'a str) -> Self {
        if value == WILDCARD {
            Self::Wildcard
        } else {
            Self::Exact(value)
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Returns true for values that contain the wildcard without being the wildcard, e.g. `foo*`.
    pub fn is_partial_wildcard(value: &str) -> bool {
        value != WILDCARD && value.contains(WILDCARD)
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Exact(v) => *v == value,
        }
    }
}

impl fmt::Display for Component<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => WILDCARD.fmt(f),
            Self::Exact(v) => v.fmt(f),
        }
    }
}

// === impl ServicePattern ===

impl<'a> ServicePattern<'a> {
    pub fn new(namespace: &'a str, name: &'a str) -> Self {
        Self { namespace, name }
    }

    pub fn namespace(&self) -> Component<'a> {
        Component::new(self.namespace)
    }

    pub fn name(&self) -> Component<'a> {
        Component::new(self.name)
    }

    /// Counts the exact components of the pattern: 0 for `*/*`, 1 for `ns/*` and 2 for `ns/name`.
    ///
    /// An exact name can never follow a wildcard namespace, so a wildcard namespace always counts
    /// as zero.
    pub fn exact_count(&self) -> u32 {
        match (self.namespace(), self.name()) {
            (Component::Wildcard, _) => 0,
            (Component::Exact(_), Component::Wildcard) => 1,
            (Component::Exact(_), Component::Exact(_)) => 2,
        }
    }

    /// Indicates whether the concrete service `namespace/name` is selected by this pattern.
    pub fn matches(&self, namespace: &str, name: &str) -> bool {
        match self.namespace() {
            Component::Wildcard => true,
            ns => ns.matches(namespace) && self.name().matches(name),
        }
    }
}

impl fmt::Display for ServicePattern<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_count() {
        let cases: &[(&str, &str, u32)] = &[
            ("*", "*", 0),
            ("default", "*", 1),
            ("default", "web", 2),
            // Invalid, but a wildcard namespace dominates.
            ("*", "web", 0),
        ];
        for (ns, name, count) in cases {
            assert_eq!(
                ServicePattern::new(ns, name).exact_count(),
                *count,
                "{ns}/{name}"
            );
        }
    }

    #[test]
    fn partial_wildcards() {
        assert!(Component::is_partial_wildcard("foo*"));
        assert!(Component::is_partial_wildcard("*foo"));
        assert!(!Component::is_partial_wildcard("*"));
        assert!(!Component::is_partial_wildcard("foo"));
    }

    #[test]
    fn matches_services() {
        assert!(ServicePattern::new("*", "*").matches("default", "web"));
        assert!(ServicePattern::new("default", "*").matches("default", "web"));
        assert!(!ServicePattern::new("default", "*").matches("other", "web"));
        assert!(ServicePattern::new("default", "web").matches("default", "web"));
        assert!(!ServicePattern::new("default", "web").matches("default", "api"));
    }

    #[test]
    fn displays_pattern() {
        assert_eq!(ServicePattern::new("default", "*").to_string(), "default/*");
        assert_eq!(ServicePattern::new("ns", "web").to_string(), "ns/web");
    }
}
