//! The per-type attribute and role registry.
//!
//! An [`EntityType`] is built once, at definition time, from a static table
//! of attribute and role declarations. It is the only authority on which
//! attribute names exist, which kinds they have, which of them generate a
//! dedicated setter event, and how event type tags are derived. Entities and
//! the replay path consult it through a shared `Arc`; there is no global
//! registry.

use std::collections::BTreeMap;

use crate::error::{DefinitionError, EntityError};
use crate::value::{Symbol, Value, NULL};

/// The declared kind of an attribute, driving write-path coercion, read-path
/// defaults, and whether a dedicated setter event kind exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Simple,
    Boolean,
    Symbol,
    SymbolList,
    SymbolMap,
}

impl AttributeKind {
    /// Normalises a supplied value into the form this kind stores.
    ///
    /// Returns a precondition error when the value cannot be expressed in
    /// this kind at all; nothing has been recorded when that happens.
    pub(crate) fn coerce(self, attribute: &str, value: Value) -> Result<Value, EntityError> {
        match self {
            AttributeKind::Simple => Ok(value),
            AttributeKind::Boolean => match value {
                Value::Null | Value::Bool(_) => Ok(value),
                _ => Err(invalid(attribute, "a boolean")),
            },
            AttributeKind::Symbol => match value {
                Value::Null => Ok(Value::Null),
                Value::Symbol(s) => Ok(Value::Symbol(s)),
                Value::Text(t) => Ok(Value::Symbol(Symbol::from(t))),
                _ => Err(invalid(attribute, "a symbol or text")),
            },
            AttributeKind::SymbolList => match value {
                Value::Null => Ok(Value::SymbolList(Vec::new())),
                Value::SymbolList(symbols) => Ok(Value::SymbolList(symbols)),
                Value::List(items) => {
                    let mut symbols = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::Symbol(s) => symbols.push(s),
                            Value::Text(t) => symbols.push(Symbol::from(t)),
                            _ => return Err(invalid(attribute, "a list of symbols or text")),
                        }
                    }
                    Ok(Value::SymbolList(symbols))
                }
                _ => Err(invalid(attribute, "a list of symbols or text")),
            },
            AttributeKind::SymbolMap => match value {
                Value::Null => Ok(Value::SymbolMap(BTreeMap::new())),
                Value::SymbolMap(map) => Ok(Value::SymbolMap(map)),
                Value::Map(map) => Ok(Value::SymbolMap(
                    map.into_iter().map(|(k, v)| (Symbol::from(k), v)).collect(),
                )),
                _ => Err(invalid(attribute, "a map")),
            },
        }
    }
}

fn invalid(attribute: &str, expected: &'static str) -> EntityError {
    EntityError::InvalidValue {
        attribute: attribute.to_owned(),
        expected,
    }
}

/// A single registry entry: one declared attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    name: String,
    kind: AttributeKind,
    default: Option<Value>,
}

impl AttributeSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Whether a dedicated `{Type}{Attr}Set` event kind exists for this
    /// attribute. Symbol-map attributes have none; their changes flow
    /// through the generic update event.
    pub fn has_set_event(&self) -> bool {
        self.kind != AttributeKind::SymbolMap
    }

    /// The value this attribute reads as, given what is stored for it.
    ///
    /// Boolean attributes substitute their declared default only when the
    /// stored value is unset, which is distinct from an explicit `false`.
    /// Symbol-array attributes read as the empty list rather than null.
    pub(crate) fn read_value(&self, stored: &Value) -> Value {
        if !stored.is_null() {
            return stored.clone();
        }

        match self.kind {
            AttributeKind::Boolean => self.default.clone().unwrap_or(Value::Bool(false)),
            AttributeKind::SymbolList => Value::SymbolList(Vec::new()),
            _ => Value::Null,
        }
    }
}

/// An immutable entity type: the set of declared attributes and roles, and
/// the synthesis rules derived from them.
#[derive(Debug, PartialEq)]
pub struct EntityType {
    name: String,
    attributes: BTreeMap<String, AttributeSpec>,
    roles: Vec<String>,
}

impl EntityType {
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder {
        EntityTypeBuilder {
            name: name.into(),
            attributes: Vec::new(),
            roles: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.values()
    }

    /// Role names in declaration order.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Accumulates attribute and role declarations; all names are validated
/// against each other when [`EntityTypeBuilder::build`] runs.
#[derive(Debug)]
pub struct EntityTypeBuilder {
    name: String,
    attributes: Vec<AttributeSpec>,
    roles: Vec<String>,
}

impl EntityTypeBuilder {
    pub fn simple(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Simple, None)
    }

    pub fn boolean(self, name: impl Into<String>, default: bool) -> Self {
        self.attribute(name, AttributeKind::Boolean, Some(Value::Bool(default)))
    }

    pub fn symbol(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Symbol, None)
    }

    pub fn symbol_list(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::SymbolList, None)
    }

    pub fn symbol_map(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::SymbolMap, None)
    }

    pub fn role(mut self, name: impl Into<String>) -> Self {
        self.roles.push(name.into());
        self
    }

    fn attribute(mut self, name: impl Into<String>, kind: AttributeKind, default: Option<Value>) -> Self {
        self.attributes.push(AttributeSpec {
            name: name.into(),
            kind,
            default,
        });
        self
    }

    pub fn build(self) -> Result<EntityType, DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::BlankName);
        }

        let mut attributes: BTreeMap<String, AttributeSpec> = BTreeMap::new();
        for spec in self.attributes {
            if spec.name.trim().is_empty() {
                return Err(DefinitionError::BlankName);
            }
            match attributes.get(&spec.name) {
                // Redeclaring the identical spec is accepted and idempotent.
                Some(existing) if *existing == spec => {}
                Some(_) => return Err(DefinitionError::ConflictingAttribute(spec.name)),
                None => {
                    attributes.insert(spec.name.clone(), spec);
                }
            }
        }

        let mut roles: Vec<String> = Vec::new();
        for role in self.roles {
            if role.trim().is_empty() {
                return Err(DefinitionError::BlankName);
            }
            if attributes.contains_key(&role) {
                return Err(DefinitionError::ConflictingRole(role));
            }
            if !roles.contains(&role) {
                roles.push(role);
            }
        }

        Ok(EntityType {
            name: self.name,
            attributes,
            roles,
        })
    }
}

/// Empty attribute map for a freshly constructed entity of this type: every
/// declared attribute present, unset. The member set never changes after.
pub(crate) fn blank_attributes(entity_type: &EntityType) -> BTreeMap<String, Value> {
    entity_type
        .attributes()
        .map(|spec| (spec.name().to_owned(), NULL))
        .collect()
}

pub(crate) fn blank_roles(entity_type: &EntityType) -> BTreeMap<String, Vec<uuid::Uuid>> {
    entity_type
        .roles()
        .iter()
        .map(|role| (role.clone(), Vec::new()))
        .collect()
}

/// `account_settings` -> `AccountSettings`, the way event kind names are
/// derived from entity type and attribute names.
pub(crate) fn pascal_case(term: &str) -> String {
    term.split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
