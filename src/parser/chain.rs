//! Ordered fallback chains
//!
//! A chain is a table of named strategies tried in order; the first one that
//! yields a value wins and later ones are never consulted. Tables are plain
//! data so each chain can be read, tested and extended without touching the
//! control flow that walks it.

use scraper::{ElementRef, Selector};

/// One named strategy in a fallback chain
#[derive(Debug, Clone, Copy)]
pub struct Rule<S> {
    /// Short label used in logs and progress output
    pub name: &'static str,

    pub strategy: S,
}

/// A value together with the rule that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub rule: &'static str,
    pub value: T,
}

/// Walks `rules` in order and returns the first value `apply` produces
///
/// # Example
///
/// ```
/// use listing_harvest::parser::{first_match, Rule};
///
/// const RULES: &[Rule<i32>] = &[
///     Rule { name: "odd", strategy: 3 },
///     Rule { name: "even", strategy: 4 },
/// ];
///
/// let hit = first_match(RULES, |n| (n % 2 == 0).then_some(*n)).unwrap();
/// assert_eq!(hit.rule, "even");
/// assert_eq!(hit.value, 4);
/// ```
pub fn first_match<S, T>(
    rules: &[Rule<S>],
    mut apply: impl FnMut(&S) -> Option<T>,
) -> Option<Resolved<T>> {
    rules.iter().find_map(|rule| {
        apply(&rule.strategy).map(|value| Resolved {
            rule: rule.name,
            value,
        })
    })
}

/// First element under `scope` matching a CSS selector
pub fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

/// All elements under `scope` matching a CSS selector
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Visible text of an element
///
/// Each text node is trimmed and the pieces are joined without a separator.
/// Returns None when nothing but whitespace is left.
pub fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text: String = element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text of the first element matching `css` under `scope`, if non-empty
pub fn select_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    select_first(scope, css).and_then(element_text)
}

/// Returns true if any class token contains `needle` (case-insensitive)
pub fn has_class_containing(element: ElementRef<'_>, needle: &str) -> bool {
    let needle = needle.to_ascii_lowercase();
    element
        .value()
        .classes()
        .any(|class| class.to_ascii_lowercase().contains(&needle))
}
