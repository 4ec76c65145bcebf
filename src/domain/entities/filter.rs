use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::entities::field::{Field, FieldCatalog, ValueType};

/// One client-supplied filter value. A term without a field is the global
/// free-text term.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterTerm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type", alias = "fieldtype", default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub term: String,
    #[serde(default, alias = "isnew", skip_serializing_if = "std::ops::Not::not")]
    pub is_new: bool,
}

impl FilterTerm {
    pub fn global(term: impl Into<String>) -> Self {
        Self {
            field: None,
            value_type: ValueType::String,
            term: term.into(),
            is_new: false,
        }
    }

    pub fn field(field: impl Into<String>, value_type: ValueType, term: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            value_type,
            term: term.into(),
            is_new: false,
        }
    }

    pub fn is_global(&self) -> bool {
        self.field.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

/// Structured filter condition. Values are never spliced into query text;
/// the store binds them as parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Equals { field: String, value: FilterValue },
    /// Case-insensitive substring match; `needle` is already lower-cased.
    Like { field: String, needle: String },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// True when the tree holds no leaf clause and therefore filters nothing.
    pub fn is_vacuous(&self) -> bool {
        match self {
            Predicate::Equals { .. } | Predicate::Like { .. } => false,
            Predicate::And(children) | Predicate::Or(children) => {
                children.iter().all(Predicate::is_vacuous)
            }
        }
    }
}

pub struct FilterBuilder;

impl FilterBuilder {
    /// Returns `None` when no term was supplied at all. Supplied terms that
    /// produce no clause still yield `Some` with an empty group.
    pub fn build(
        catalog: &FieldCatalog,
        global_term: Option<&str>,
        field_terms: &[FilterTerm],
    ) -> Option<Predicate> {
        let global_term = global_term.map(str::trim).filter(|term| !term.is_empty());
        let field_terms: Vec<&FilterTerm> = field_terms
            .iter()
            .filter(|term| !term.is_global() && !term.term.is_empty())
            .collect();

        if global_term.is_none() && field_terms.is_empty() {
            return None;
        }

        let global_group = global_term
            .map(|term| Self::global_group(catalog.fields(), term))
            .filter(|group| !group.is_empty());
        let field_group = Some(Self::field_group(catalog, &field_terms))
            .filter(|group| !group.is_empty());

        let predicate = match (global_group, field_group) {
            (Some(global), Some(fields)) => {
                Predicate::And(vec![Predicate::Or(global), Predicate::And(fields)])
            }
            (Some(global), None) => Predicate::Or(global),
            (None, Some(fields)) => Predicate::And(fields),
            (None, None) => Predicate::And(Vec::new()),
        };
        Some(predicate)
    }

    pub fn from_terms(catalog: &FieldCatalog, terms: &[FilterTerm]) -> Option<Predicate> {
        let global = terms
            .iter()
            .find(|term| term.is_global() && !term.term.trim().is_empty())
            .map(|term| term.term.as_str());
        Self::build(catalog, global, terms)
    }

    fn global_group(fields: &[Field], term: &str) -> Vec<Predicate> {
        let term = term.to_lowercase();
        let as_int = term.parse::<i64>().ok();

        fields
            .iter()
            .filter(|field| field.visible)
            .filter_map(|field| match (field.value_type, as_int) {
                (ValueType::Int, Some(value)) => Some(Predicate::Equals {
                    field: field.name.clone(),
                    value: FilterValue::Int(value),
                }),
                (ValueType::String, None) => Some(Predicate::Like {
                    field: field.name.clone(),
                    needle: term.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    fn field_group(catalog: &FieldCatalog, terms: &[&FilterTerm]) -> Vec<Predicate> {
        let mut clauses = Vec::new();
        for term in terms {
            let Some(name) = term.field.as_deref() else {
                continue;
            };
            let Some(field) = catalog.get(name) else {
                debug!(field = name, "dropping filter term for unknown field");
                continue;
            };
            let value = match field.value_type {
                ValueType::Int => term.term.trim().parse::<i64>().ok().map(FilterValue::Int),
                ValueType::Bool => parse_bool(&term.term).map(FilterValue::Bool),
                ValueType::String => Some(FilterValue::Text(term.term.clone())),
            };
            match value {
                Some(value) => clauses.push(Predicate::Equals {
                    field: field.name.clone(),
                    value,
                }),
                None => debug!(
                    field = name,
                    term = term.term.as_str(),
                    "filter term does not fit field type"
                ),
            }
        }
        clauses
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
