//! Built-in callee names that never become call graph edges.
//!
//! The check runs before catalog membership is considered, so a user function
//! that happens to be called `map` or `log` is never recorded as a callee.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// DOM method names.
const DOM_METHODS: &[&str] = &[
    "addEventListener",
    "removeEventListener",
    "dispatchEvent",
    "querySelector",
    "querySelectorAll",
    "getElementById",
    "getElementsByClassName",
    "getElementsByTagName",
    "createElement",
    "createTextNode",
    "appendChild",
    "removeChild",
    "replaceChild",
    "insertBefore",
    "setAttribute",
    "getAttribute",
    "removeAttribute",
    "preventDefault",
    "stopPropagation",
    "focus",
    "blur",
    "click",
];

/// Array method names.
const ARRAY_METHODS: &[&str] = &[
    "push", "pop", "shift", "unshift", "slice", "splice", "concat", "join", "reverse", "sort",
    "map", "filter", "reduce", "reduceRight", "forEach", "find", "findIndex", "some", "every",
    "includes", "indexOf", "lastIndexOf", "flat", "flatMap", "fill", "keys", "values", "entries",
    "from", "isArray",
];

/// String method names.
const STRING_METHODS: &[&str] = &[
    "split",
    "replace",
    "replaceAll",
    "trim",
    "trimStart",
    "trimEnd",
    "toLowerCase",
    "toUpperCase",
    "substring",
    "substr",
    "charAt",
    "charCodeAt",
    "startsWith",
    "endsWith",
    "padStart",
    "padEnd",
    "repeat",
    "match",
    "toString",
];

/// console method names.
const CONSOLE_METHODS: &[&str] = &["log", "warn", "error", "info", "debug", "trace", "table"];

/// JSON method names.
const JSON_METHODS: &[&str] = &["parse", "stringify"];

/// Timer function names.
const TIMER_FUNCTIONS: &[&str] = &[
    "setTimeout",
    "setInterval",
    "clearTimeout",
    "clearInterval",
    "requestAnimationFrame",
    "cancelAnimationFrame",
];

/// Immutable set of callee names excluded from the call relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denylist {
    names: BTreeSet<String>,
}

impl Denylist {
    /// The default set of DOM, array, string, console, JSON and timer names.
    pub fn builtin() -> Self {
        [
            DOM_METHODS,
            ARRAY_METHODS,
            STRING_METHODS,
            CONSOLE_METHODS,
            JSON_METHODS,
            TIMER_FUNCTIONS,
        ]
        .iter()
        .flat_map(|group| group.iter().copied())
        .collect()
    }

    /// A denylist that excludes nothing.
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Return a copy with additional names denied.
    pub fn extended<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = self.names.clone();
        names.extend(extra.into_iter().map(Into::into));
        Self { names }
    }

    /// Return a copy with the given names allowed again.
    pub fn without<I, S>(&self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = self.names.clone();
        for name in allowed {
            names.remove(name.as_ref());
        }
        Self { names }
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for Denylist {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<S: Into<String>> FromIterator<S> for Denylist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
