use extractors::{Entity, EntityInfo, TransactionParser};
use serde::Serialize;
use shared_types::{LabelParts, LabelRepresentations};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("Label {representation:?} is claimed by both {existing:?} and {duplicate:?}")]
    DuplicateLabel {
        representation: String,
        existing: String,
        duplicate: String,
    },

    #[error("No parsers registered, there is nothing to search for")]
    NoLabels,

    #[error("No parser bound to any of the labels {0:?}")]
    NoBinding(Vec<String>),
}

/// Association between a label and the parser responsible for it
#[derive(Clone)]
pub struct ParserBinding {
    /// Position of the parser within its entity
    pub ordinal: usize,
    pub entity: EntityInfo,
    pub parser: Arc<dyn TransactionParser>,
    pub label: LabelRepresentations,
}

impl fmt::Debug for ParserBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserBinding")
            .field("ordinal", &self.ordinal)
            .field("entity", &self.entity.id)
            .field("parser", &self.parser.identity().name)
            .field("label", &self.label.raw)
            .finish()
    }
}

/// Predicate scoped to a single label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelQuery {
    pub label: LabelRepresentations,
    pub predicate: String,
}

/// Everything a mail source needs to fetch candidate threads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    /// `in:unread (label:a | label:b ...)`
    pub combined: String,
    pub per_label: Vec<LabelQuery>,
}

impl SearchQuery {
    /// Whether `label` is any representation of a label in this query.
    pub fn matches_label(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.per_label.iter().any(|item| {
            item.label
                .all()
                .iter()
                .any(|representation| representation.to_lowercase() == label)
        })
    }
}

#[derive(Debug, Serialize)]
pub struct BindingSummary {
    pub ordinal: usize,
    pub entity: EntityInfo,
    pub parser: String,
    pub version: String,
    pub label: LabelRepresentations,
    pub parts: Option<LabelParts>,
}

#[derive(Debug, Serialize)]
pub struct RouterSummary {
    pub bindings: Vec<BindingSummary>,
    pub labels: Vec<String>,
    pub query: SearchQuery,
}

/// Maps every label representation to its parser binding and builds the
/// search predicates used to fetch candidate messages.
///
/// The index is built once in [`QueryBuilder::new`] and is read-only
/// afterwards. Keys are stored lowercased.
pub struct QueryBuilder {
    bindings: Vec<ParserBinding>,
    index: HashMap<String, usize>,
    labels: Vec<String>,
    query: SearchQuery,
}

impl QueryBuilder {
    pub fn new(entities: &[Entity]) -> Result<Self, RoutingError> {
        let mut bindings: Vec<ParserBinding> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut labels = Vec::new();

        for entity in entities {
            for (ordinal, parser) in entity.parsers.iter().enumerate() {
                let label = LabelRepresentations::derive(&parser.identity().label);
                let position = bindings.len();

                for representation in label.all() {
                    let key = representation.to_lowercase();

                    if let Some(&existing) = index.get(&key) {
                        if existing != position {
                            return Err(RoutingError::DuplicateLabel {
                                representation: key,
                                existing: bindings[existing].parser.identity().name.clone(),
                                duplicate: parser.identity().name.clone(),
                            });
                        }
                        continue;
                    }

                    index.insert(key, position);
                }

                tracing::debug!(
                    entity = %entity.info.id,
                    parser = %parser.identity().name,
                    label = %label.query,
                    "Registered parser binding"
                );

                labels.push(label.query.clone());
                bindings.push(ParserBinding {
                    ordinal,
                    entity: entity.info.clone(),
                    parser: parser.clone(),
                    label,
                });
            }
        }

        if bindings.is_empty() {
            return Err(RoutingError::NoLabels);
        }

        let mut builder = Self {
            bindings,
            index,
            labels,
            query: SearchQuery {
                combined: String::new(),
                per_label: Vec::new(),
            },
        };
        builder.query = builder.build();

        Ok(builder)
    }

    /// Build the combined and per-label predicates, in registration order.
    ///
    /// Example: `in:unread (label:biyete-a | label:biyete-b)`
    pub fn build(&self) -> SearchQuery {
        let mut tags = Vec::with_capacity(self.labels.len());
        let mut per_label = Vec::with_capacity(self.labels.len());

        for label in &self.labels {
            let Some(binding) = self.lookup_by_label_name(label) else {
                continue;
            };

            let tag = format!("label:{}", binding.label.query);
            per_label.push(LabelQuery {
                label: binding.label.clone(),
                predicate: format!("in:unread ({})", tag),
            });
            tags.push(tag);
        }

        SearchQuery {
            combined: format!("in:unread ({})", tags.join(" | ")),
            per_label,
        }
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Query representations of every registered label, in registration order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn bindings(&self) -> &[ParserBinding] {
        &self.bindings
    }

    /// Case-insensitive lookup of any label representation
    pub fn lookup_by_label_name(&self, name: &str) -> Option<&ParserBinding> {
        let key = name.to_lowercase();
        let binding = self.index.get(&key).map(|&position| &self.bindings[position]);

        if let Some(binding) = binding {
            tracing::debug!(label = %key, parser = %binding.parser.identity().name, "Binding found");
        }

        binding
    }

    /// First label in `labels` with a binding wins; later matches are ignored.
    pub fn lookup_by_label_set<S: AsRef<str>>(&self, labels: &[S]) -> Option<&ParserBinding> {
        labels
            .iter()
            .find_map(|label| self.lookup_by_label_name(label.as_ref()))
    }

    pub fn resolve_parser_for_label_set<S: AsRef<str>>(
        &self,
        labels: &[S],
    ) -> Result<Arc<dyn TransactionParser>, RoutingError> {
        self.lookup_by_label_set(labels)
            .map(|binding| binding.parser.clone())
            .ok_or_else(|| {
                RoutingError::NoBinding(labels.iter().map(|l| l.as_ref().to_string()).collect())
            })
    }

    pub fn summary(&self) -> RouterSummary {
        RouterSummary {
            bindings: self
                .bindings
                .iter()
                .map(|binding| BindingSummary {
                    ordinal: binding.ordinal,
                    entity: binding.entity.clone(),
                    parser: binding.parser.identity().name.clone(),
                    version: binding.parser.identity().version.clone(),
                    label: binding.label.clone(),
                    parts: LabelParts::parse(&binding.label.raw),
                })
                .collect(),
            labels: self.labels.clone(),
            query: self.query.clone(),
        }
    }
}
