//! Product form rules.
//!
//! The Store accepts any payload; these rules run in the view layer before a
//! create or update is dispatched.

use crate::types::NewProduct;
use regex::Regex;
use std::sync::LazyLock;

/// Accepts URLs with or without an http(s) scheme
static URL_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(https?://)?([\da-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$"));

/// Minimum title length, in characters
pub const TITLE_MIN_CHARS: usize = 3;
/// Minimum description length, in characters
pub const DESCRIPTION_MIN_CHARS: usize = 10;
/// Smallest accepted price
pub const PRICE_MIN: f64 = 0.01;

/// Form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `title`
    Title,
    /// `price`
    Price,
    /// `description`
    Description,
    /// `category`
    Category,
    /// `image`
    Image,
}

/// Violated rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The field is empty
    Required,
    /// The field is shorter than the given number of characters
    MinLength(usize),
    /// The value is below the minimum
    Min,
    /// The value is not a URL
    InvalidUrl,
}

impl Rule {
    /// Message shown under the field
    #[must_use]
    pub fn message(self) -> String {
        match self {
            Self::Required => "Este campo é obrigatório".to_string(),
            Self::MinLength(n) => format!("Mínimo de {n} caracteres"),
            Self::Min => "O valor deve ser maior que zero".to_string(),
            Self::InvalidUrl => "URL inválida".to_string(),
        }
    }
}

/// One failed rule on one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    /// Offending field
    pub field: Field,
    /// Rule it broke
    pub rule: Rule,
}

/// Whether `value` looks like an http(s) URL
///
/// Empty values pass; emptiness is the `Required` rule's concern.
#[must_use]
pub fn is_valid_url(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    match &*URL_PATTERN {
        Ok(pattern) => pattern.is_match(value),
        Err(e) => {
            tracing::error!(error = %e, "URL pattern failed to compile");
            false
        },
    }
}

fn min_chars(value: &str, min: usize) -> Option<Rule> {
    if value.is_empty() {
        Some(Rule::Required)
    } else if value.chars().count() < min {
        Some(Rule::MinLength(min))
    } else {
        None
    }
}

/// Check `form` against every rule
///
/// Reports at most one error per field, in field order.
///
/// # Errors
///
/// Returns every [`FieldError`] found.
pub fn validate_form(form: &NewProduct) -> Result<(), Vec<FieldError>> {
    let price_rule = if form.price.is_nan() || form.price < PRICE_MIN {
        Some(Rule::Min)
    } else {
        None
    };

    let category_rule = form.category.is_empty().then_some(Rule::Required);

    let image_rule = if form.image.is_empty() {
        Some(Rule::Required)
    } else if is_valid_url(&form.image) {
        None
    } else {
        Some(Rule::InvalidUrl)
    };

    let errors: Vec<FieldError> = [
        (Field::Title, min_chars(&form.title, TITLE_MIN_CHARS)),
        (Field::Price, price_rule),
        (Field::Description, min_chars(&form.description, DESCRIPTION_MIN_CHARS)),
        (Field::Category, category_rule),
        (Field::Image, image_rule),
    ]
    .into_iter()
    .filter_map(|(field, rule)| rule.map(|rule| FieldError { field, rule }))
    .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
