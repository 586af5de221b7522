//! Validity policies
//!
//! One policy per accepted document type, describing how old the document
//! may be on the day it is checked.

use dvp_core::normalize_type_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Allowed age window for one document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityPolicy {
    /// Policy-table key (ex: "reference-letter")
    pub document_type_key: String,

    /// Youngest accepted age in days, inclusive
    #[serde(default)]
    pub min_age_days: u32,

    /// Oldest accepted age in days, inclusive
    pub max_age_days: u32,

    /// The checked date is the end of a decree period rather than the
    /// issue date
    #[serde(default)]
    pub is_decree_based: bool,
}

impl ValidityPolicy {
    pub fn new(document_type_key: impl Into<String>, max_age_days: u32) -> Self {
        Self {
            document_type_key: document_type_key.into(),
            min_age_days: 0,
            max_age_days,
            is_decree_based: false,
        }
    }

    pub fn with_min_age(mut self, days: u32) -> Self {
        self.min_age_days = days;
        self
    }

    pub fn decree_based(mut self) -> Self {
        self.is_decree_based = true;
        self
    }

    pub fn admits(&self, age_days: u32) -> bool {
        self.min_age_days <= age_days && age_days <= self.max_age_days
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("duplicate policy for document type '{0}'")]
    Duplicate(String),

    #[error("policy '{key}' has min_age_days {min} greater than max_age_days {max}")]
    InvertedWindow { key: String, min: u32, max: u32 },

    #[error("policy with an empty document type key")]
    EmptyKey,
}

/// Immutable lookup of policies by normalized document-type key
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyTable {
    policies: BTreeMap<String, ValidityPolicy>,
}

impl PolicyTable {
    /// Build a table, rejecting duplicates and inverted windows.
    pub fn new(policies: Vec<ValidityPolicy>) -> Result<Self, PolicyError> {
        let mut table = BTreeMap::new();
        for mut policy in policies {
            let key = normalize_type_key(&policy.document_type_key);
            if key.is_empty() {
                return Err(PolicyError::EmptyKey);
            }
            if policy.min_age_days > policy.max_age_days {
                return Err(PolicyError::InvertedWindow {
                    key,
                    min: policy.min_age_days,
                    max: policy.max_age_days,
                });
            }
            policy.document_type_key = key.clone();
            if table.insert(key.clone(), policy).is_some() {
                return Err(PolicyError::Duplicate(key));
            }
        }
        Ok(Self { policies: table })
    }

    pub fn get(&self, doc_type: &str) -> Option<&ValidityPolicy> {
        self.policies.get(&normalize_type_key(doc_type))
    }

    pub fn contains(&self, doc_type: &str) -> bool {
        self.get(doc_type).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// Document types accepted for a deferment request out of the box
pub fn default_policies() -> Vec<ValidityPolicy> {
    vec![
        ValidityPolicy::new("medical-certificate", 30),
        ValidityPolicy::new("reference-letter", 30),
        ValidityPolicy::new("income-certificate", 30),
        ValidityPolicy::new("unemployment-certificate", 30),
        ValidityPolicy::new("military-service-certificate", 90),
        ValidityPolicy::new("disability-certificate", 365),
        ValidityPolicy::new("childcare-leave-order", 0).decree_based(),
        ValidityPolicy::new("maternity-leave-certificate", 0).decree_based(),
    ]
}

impl PolicyTable {
    /// Table of [`default_policies`], keyed the same way [`PolicyTable::new`] keys them
    pub fn with_defaults() -> Self {
        let policies = default_policies()
            .into_iter()
            .map(|mut policy| {
                let key = normalize_type_key(&policy.document_type_key);
                policy.document_type_key = key.clone();
                (key, policy)
            })
            .collect();
        Self { policies }
    }
}
