//! Static registries: countries, the entities operating in them and the
//! parsers each entity declares.

use crate::banco_estado;
use crate::parser::TransactionParser;
use serde::Serialize;
use shared_types::Currency;
use std::fmt;
use std::sync::Arc;

/// Identity of an entity, carried by every routing binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityInfo {
    pub id: String,
    pub name: String,
}

/// A bank or payment provider and its parsers, in routing order
#[derive(Clone)]
pub struct Entity {
    pub info: EntityInfo,
    pub parsers: Vec<Arc<dyn TransactionParser>>,
}

impl Entity {
    pub fn new(id: &str, name: &str, parsers: Vec<Arc<dyn TransactionParser>>) -> Self {
        Self {
            info: EntityInfo {
                id: id.to_string(),
                name: name.to_string(),
            },
            parsers,
        }
    }

    /// Labels declared by this entity's parsers
    pub fn labels(&self) -> Vec<&str> {
        self.parsers
            .iter()
            .map(|parser| parser.identity().label.as_str())
            .collect()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("info", &self.info)
            .field("labels", &self.labels())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Country {
    pub id: String,
    pub name: String,
    pub entities: Vec<Entity>,
    pub currencies: Vec<Currency>,
    pub timezones: Vec<String>,
}

pub fn banco_estado() -> Entity {
    Entity::new(
        banco_estado::ENTITY_ID,
        banco_estado::ENTITY_NAME,
        banco_estado::parsers(),
    )
}

pub fn chile() -> Country {
    Country {
        id: "cl".to_string(),
        name: "Chile".to_string(),
        entities: vec![banco_estado()],
        currencies: vec![Currency::clp()],
        timezones: vec![
            "America/Santiago".to_string(),
            "America/Punta_Arenas".to_string(),
            "Pacific/Easter".to_string(),
        ],
    }
}

/// Every country with at least one supported entity
pub fn default_countries() -> Vec<Country> {
    vec![chile()]
}
