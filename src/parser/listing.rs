//! Search-result page parsing
//!
//! A result page is read in three passes, each driven by its own fallback
//! chain: locate the result cards, pull one listing link out of each card, and
//! decide whether an enabled "next page" control exists.

use crate::parser::chain::{first_match, has_class_containing, select_all, select_first, Resolved, Rule};
use crate::url::resolve_listing_href;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// How to locate result cards on a page
#[derive(Debug, Clone, Copy)]
pub enum CardStrategy {
    /// Every element matching a CSS selector is a card
    Selector(&'static str),

    /// The nearest `div` ancestor of each business-name link whose class
    /// mentions "result"
    EnclosingResultDiv,
}

/// How to find the listing link inside one card
#[derive(Debug, Clone, Copy)]
pub enum LinkStrategy {
    Selector(&'static str),

    /// First anchor with a class token containing the given text
    AnchorClassContaining(&'static str),
}

/// How to detect a following result page
#[derive(Debug, Clone, Copy)]
pub enum NextPageStrategy {
    /// The first element matching the selector, if it is not disabled
    Control(&'static str),

    /// Any pagination anchor whose class mentions "next" but not "disabled"
    PaginationAnchor,
}

pub const CARD_RULES: &[Rule<CardStrategy>] = &[
    Rule { name: "div.result", strategy: CardStrategy::Selector("div.result") },
    Rule { name: "div.organic", strategy: CardStrategy::Selector("div.organic") },
    Rule { name: "div.srp-listing", strategy: CardStrategy::Selector("div.srp-listing") },
    Rule { name: "div.business-card", strategy: CardStrategy::Selector("div.business-card") },
    Rule { name: "div[data-impression]", strategy: CardStrategy::Selector("div[data-impression]") },
    Rule { name: "business-name ancestor", strategy: CardStrategy::EnclosingResultDiv },
];

pub const LINK_RULES: &[Rule<LinkStrategy>] = &[
    Rule { name: "a.business-name", strategy: LinkStrategy::Selector("a.business-name") },
    Rule { name: "listing href", strategy: LinkStrategy::Selector(r#"a[href*="/mip/"]"#) },
    Rule { name: "h2.business-name a", strategy: LinkStrategy::Selector("h2.business-name a") },
    Rule { name: "h3.business-name a", strategy: LinkStrategy::Selector("h3.business-name a") },
    Rule { name: "business class", strategy: LinkStrategy::AnchorClassContaining("business") },
    Rule { name: "a[data-business]", strategy: LinkStrategy::Selector("a[data-business]") },
];

pub const NEXT_PAGE_RULES: &[Rule<NextPageStrategy>] = &[
    Rule { name: "aria-label", strategy: NextPageStrategy::Control(r#"a[aria-label="Next"]"#) },
    Rule { name: "rel=next", strategy: NextPageStrategy::Control(r#"a[rel~="next"]"#) },
    Rule { name: "a.next", strategy: NextPageStrategy::Control("a.next") },
    Rule { name: "a.next-page", strategy: NextPageStrategy::Control("a.next-page") },
    Rule { name: "pagination", strategy: NextPageStrategy::PaginationAnchor },
];

/// Everything discovery needs from one result page
#[derive(Debug, Clone, Default)]
pub struct ResultPage {
    /// Number of result cards found
    pub card_count: usize,

    /// The card rule that matched, if any did
    pub card_rule: Option<&'static str>,

    /// Listing links in card order, one per card at most
    pub links: Vec<Url>,

    /// Whether an enabled "next page" control is present
    pub has_next_page: bool,
}

/// Parses a search-result page
///
/// Parsing never fails: a page that matches no rule yields zero cards and no
/// next page.
///
/// # Arguments
///
/// * `html` - The page body
/// * `base_url` - The site origin that relative listing links resolve against
///
/// # Example
///
/// ```
/// use listing_harvest::parser::parse_result_page;
/// use url::Url;
///
/// let html = r#"<div class="result"><a class="business-name" href="/mip/a-1">A</a></div>
///               <a class="next" href="?page=2">Next</a>"#;
/// let base = Url::parse("https://www.yellowpages.com").unwrap();
/// let page = parse_result_page(html, &base);
/// assert_eq!(page.card_count, 1);
/// assert_eq!(page.links[0].as_str(), "https://www.yellowpages.com/mip/a-1");
/// assert!(page.has_next_page);
/// ```
pub fn parse_result_page(html: &str, base_url: &Url) -> ResultPage {
    let document = Html::parse_document(html);
    let has_next_page = has_next_page(&document);

    let Some(cards) = find_result_cards(&document) else {
        return ResultPage {
            has_next_page,
            ..ResultPage::default()
        };
    };

    let links = cards
        .value
        .iter()
        .filter_map(|card| card_listing_link(*card, base_url))
        .collect();

    ResultPage {
        card_count: cards.value.len(),
        card_rule: Some(cards.rule),
        links,
        has_next_page,
    }
}

/// Locates result cards using the first card rule that matches anything
pub fn find_result_cards(document: &Html) -> Option<Resolved<Vec<ElementRef<'_>>>> {
    let root = document.root_element();
    first_match(CARD_RULES, |strategy| {
        let cards = match strategy {
            CardStrategy::Selector(css) => select_all(root, css),
            CardStrategy::EnclosingResultDiv => enclosing_result_divs(root),
        };
        (!cards.is_empty()).then_some(cards)
    })
}

/// Finds the listing URL inside one card
///
/// Each link rule looks at the first anchor it matches. An anchor without a
/// usable href lets the next rule have a go.
pub fn card_listing_link(card: ElementRef<'_>, base_url: &Url) -> Option<Url> {
    first_match(LINK_RULES, |strategy| {
        let anchor = match strategy {
            LinkStrategy::Selector(css) => select_first(card, css),
            LinkStrategy::AnchorClassContaining(needle) => select_all(card, "a")
                .into_iter()
                .find(|a| has_class_containing(*a, needle)),
        }?;
        resolve_listing_href(anchor.value().attr("href")?, base_url)
    })
    .map(|resolved| resolved.value)
}

/// Returns true if the page shows an enabled "next page" control
pub fn has_next_page(document: &Html) -> bool {
    let root = document.root_element();
    first_match(NEXT_PAGE_RULES, |strategy| match strategy {
        NextPageStrategy::Control(css) => select_first(root, css).filter(|el| !is_disabled(*el)),
        NextPageStrategy::PaginationAnchor => select_all(root, "div.pagination a")
            .into_iter()
            .find(|a| has_class_containing(*a, "next") && !has_class_containing(*a, "disabled")),
    })
    .is_some()
}

fn is_disabled(element: ElementRef<'_>) -> bool {
    let value = element.value();
    value.attr("disabled").is_some()
        || value
            .attr("aria-disabled")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
        || value.classes().any(|class| class.eq_ignore_ascii_case("disabled"))
}

fn enclosing_result_divs(root: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut seen = HashSet::new();
    let mut cards = Vec::new();

    for link in select_all(root, "a.business-name") {
        let card = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "div" && has_class_containing(*el, "result"));

        if let Some(card) = card {
            if seen.insert(card.id()) {
                cards.push(card);
            }
        }
    }

    cards
}
