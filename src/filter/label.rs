//! Label synthesis for rule bodies
//!
//! Deterministic: the same body always yields the same label. Single
//! criteria go literal table → property template → generic fallback;
//! multi-criterion bodies go composite table → owner pair → counted summary.

use crate::constants::filter::EMPTY_BODY_LABEL;

use super::phrases::{self, PhraseBook};
use super::schema::{Criterion, FilterValue, Property};

pub fn synthesize(body: &[Criterion]) -> String {
    synthesize_with(&phrases::DEFAULT, body)
}

pub fn synthesize_with(book: &PhraseBook, body: &[Criterion]) -> String {
    match body {
        [] => EMPTY_BODY_LABEL.to_string(),
        [single] => single_label(book, single),
        _ => composite_label(book, body),
    }
}

fn single_label(book: &PhraseBook, criterion: &Criterion) -> String {
    let literal = match (criterion.property(), criterion.value()) {
        (Property::OwnerName, FilterValue::Text(owner)) => book.owner_phrase(owner),
        (Property::WindowName, FilterValue::Text(title)) => book.window_phrase(title),
        _ => None,
    };
    if let Some(phrase) = literal {
        return phrase.to_string();
    }

    book.template(criterion.property())
        .and_then(|template| template.render(criterion.value()))
        .unwrap_or_else(|| fallback_label(criterion))
}

fn composite_label(book: &PhraseBook, body: &[Criterion]) -> String {
    if let Some(phrase) = book.composite(body) {
        return phrase.to_string();
    }

    let owner = body
        .iter()
        .filter(|c| c.property() == Property::OwnerName)
        .find_map(|c| c.value().as_text());

    if let [first, second] = body
        && let Some(owner) = owner
    {
        let other = if first.property() == Property::OwnerName { second } else { first };
        if other.property() != Property::OwnerName
            && let Some(description) = book.owner_pair(other)
        {
            return format!("{owner} {description} excluded");
        }
    }

    match owner {
        Some(owner) => format!("{owner} composite filter ({} conditions)", body.len()),
        None => format!("composite filter ({} conditions)", body.len()),
    }
}

fn fallback_label(criterion: &Criterion) -> String {
    format!("{}:{} excluded", criterion.property(), criterion.value())
}
