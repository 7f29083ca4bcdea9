use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every label this project owns in the mail provider.
pub const LABEL_PREFIX: &str = "biyete";

/// The four representations a declared label is known by.
///
/// `raw` is the label as declared by a parser, `formatted` is the search-safe
/// form, `key` is the provider's nested label name and `query` is the tag used
/// inside a search predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelRepresentations {
    pub raw: String,
    pub formatted: String,
    pub key: String,
    pub query: String,
}

impl LabelRepresentations {
    /// Derive all representations of a label.
    ///
    /// Only the first space is replaced with `+`. Labels declared in the
    /// registries never carry more than one, so this is all the provider needs.
    pub fn derive(label: &str) -> Self {
        let formatted = label.replacen(' ', "+", 1).to_lowercase();
        let key = format!("{}/{}", LABEL_PREFIX, formatted);
        let query = format!("{}-{}", LABEL_PREFIX, formatted);

        Self {
            raw: label.to_string(),
            formatted,
            key,
            query,
        }
    }

    /// All four representations, in declaration order.
    pub fn all(&self) -> [&str; 4] {
        [&self.raw, &self.formatted, &self.key, &self.query]
    }
}

/// Syntactic components of a `{type}:{country}-{entity}:{context}` label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelParts {
    pub kind: String,
    pub country: String,
    pub entity: String,
    pub context: String,
}

impl LabelParts {
    pub fn parse(label: &str) -> Option<Self> {
        let mut sections = label.splitn(3, ':');
        let kind = sections.next()?.trim();
        let country_entity = sections.next()?.trim();
        let context = sections.next()?.trim();

        let (country, entity) = country_entity.split_once('-')?;

        if kind.is_empty() || country.is_empty() || entity.is_empty() || context.is_empty() {
            return None;
        }

        Some(Self {
            kind: kind.to_string(),
            country: country.to_string(),
            entity: entity.to_string(),
            context: context.to_string(),
        })
    }
}

impl fmt::Display for LabelParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.kind, self.country, self.entity, self.context
        )
    }
}
