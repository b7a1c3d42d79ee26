// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Option sources and option-list formatting.
//!
//! Every Bitable-backed option list has the same shape: optionally filter
//! the table by one field using a linkage parameter from the callback, then
//! project a single target field into option labels. The [`CATALOG`] lists
//! the sources served by this deployment; adding a source is a catalog
//! entry, not a new handler.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::bitable::{Record, RecordSet};
use crate::errors::AppError;
use crate::filter::FilterExpression;

const DEPARTMENT_FIELD: &str = "Department/ProductLine";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSource {
    /// Path segment under `/options/`
    pub name: &'static str,
    /// Bitable field projected into option labels
    pub target_field: &'static str,
    /// Bitable field the linkage value is matched against
    pub filter_field: Option<&'static str>,
    /// Linkage parameter supplying the filter value
    pub linkage_key: Option<&'static str>,
}

pub const CATALOG: [OptionSource; 5] = [
    OptionSource {
        name: "department",
        target_field: DEPARTMENT_FIELD,
        filter_field: None,
        linkage_key: None,
    },
    OptionSource {
        name: "hod",
        target_field: "HOD",
        filter_field: Some(DEPARTMENT_FIELD),
        linkage_key: Some("department"),
    },
    OptionSource {
        name: "hod_limit",
        target_field: "HOD Limit",
        filter_field: Some(DEPARTMENT_FIELD),
        linkage_key: Some("department"),
    },
    OptionSource {
        name: "tier",
        target_field: "Tier",
        filter_field: Some(DEPARTMENT_FIELD),
        linkage_key: Some("department"),
    },
    OptionSource {
        name: "ceo",
        target_field: "CEO",
        filter_field: Some(DEPARTMENT_FIELD),
        linkage_key: Some("department"),
    },
];

pub fn find_source(name: &str) -> Option<&'static OptionSource> {
    CATALOG.iter().find(|source| source.name == name)
}

impl OptionSource {
    /// Builds the record filter from the callback's linkage parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ValidationError`] if the source needs a linkage
    /// value and it is missing or blank.
    pub fn filter(
        &self,
        linkage_params: &BTreeMap<String, String>,
    ) -> Result<Option<FilterExpression>, AppError> {
        let (Some(field), Some(key)) = (self.filter_field, self.linkage_key) else {
            return Ok(None);
        };

        let value = linkage_params
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::ValidationError(format!("missing linkage parameter: {key}"))
            })?;

        FilterExpression::field_equals(field, value).map(Some)
    }

    /// Projects the target field of each record into a label.
    pub fn label(&self, record: &Record) -> Option<String> {
        record.text(self.target_field)
    }
}

/// Maps records to labels in upstream order, dropping blanks and repeats.
pub fn collect_options<F>(record_set: RecordSet, map: F) -> Vec<String>
where
    F: Fn(&Record) -> Option<String>,
{
    let mut seen = HashSet::new();
    record_set
        .into_iter()
        .filter_map(|record| map(&record))
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty() && seen.insert(label.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionItem {
    pub id: String,
    pub value: String,
    #[serde(rename = "isDefault")]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct I18nResource {
    pub locale: String,
    #[serde(rename = "isDefault")]
    pub is_default: bool,
    pub texts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionList {
    pub options: Vec<OptionItem>,
    #[serde(rename = "i18nResources", skip_serializing_if = "Vec::is_empty")]
    pub i18n_resources: Vec<I18nResource>,
    /// Set when the upstream reported more rows than one page returned
    #[serde(rename = "hasMore", skip_serializing_if = "std::ops::Not::not")]
    pub has_more: bool,
}

impl OptionList {
    /// Options whose value is an i18n key, with one text table per locale.
    ///
    /// Labels come from a single-language table, so every locale carries the
    /// same texts. The first locale is the default.
    pub fn localized(labels: &[String], locales: &[&str]) -> Self {
        let options: Vec<OptionItem> = labels
            .iter()
            .enumerate()
            .map(|(index, _)| OptionItem {
                id: option_id(index),
                value: i18n_key(index),
                is_default: false,
            })
            .collect();

        let texts: BTreeMap<String, String> = labels
            .iter()
            .enumerate()
            .map(|(index, label)| (i18n_key(index), label.clone()))
            .collect();

        let i18n_resources = locales
            .iter()
            .enumerate()
            .map(|(index, locale)| I18nResource {
                locale: normalize_locale(locale),
                is_default: index == 0,
                texts: texts.clone(),
            })
            .collect();

        Self {
            options,
            i18n_resources,
            has_more: false,
        }
    }

    /// Marks the list as cut off at the upstream page boundary.
    pub fn truncated(mut self, has_more: bool) -> Self {
        self.has_more = has_more;
        self
    }
}

fn option_id(index: usize) -> String {
    format!("opt_{index}")
}

fn i18n_key(index: usize) -> String {
    format!("@i18n@{}", option_id(index))
}

/// `zh-CN` and `zh_cn` both become `zh_cn`.
pub fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('-', "_").to_lowercase()
}
