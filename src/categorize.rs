//! Category assignment and priority scoring.
//!
//! Categorization is first-match-wins over a fixed rule order:
//!
//! 1. the endpoint's first explicit tag, mapped onto a known category when
//!    it names or contains one of its keywords;
//! 2. the longest known keyword in the parent grouping name;
//! 3. the longest known keyword in the normalized path;
//! 4. the configured default category.
//!
//! The order decides ambiguous endpoints (a folder named "Domains" holding
//! `/edge_applications/...` lands in `domains`), so it must not change
//! without bumping `category_rules_version`.
use crate::config::AnalysisConfig;
use crate::endpoint::{Endpoint, HttpMethod};
use serde::{Deserialize, Serialize};

pub const HIGH_PRIORITY_SCORE: i32 = 6;
pub const MEDIUM_PRIORITY_SCORE: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    Tag,
    ParentName,
    PathKeyword,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorization {
    pub category: String,
    pub source: CategorySource,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_score(score: i32) -> Self {
        if score >= HIGH_PRIORITY_SCORE {
            Self::High
        } else if score >= MEDIUM_PRIORITY_SCORE {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// An endpoint with its category and priority attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedEndpoint {
    #[serde(flatten)]
    pub endpoint: Endpoint,
    pub category: String,
    pub category_source: CategorySource,
    pub priority_score: i32,
    pub priority: Priority,
}

pub fn method_weight(method: HttpMethod) -> i32 {
    match method {
        HttpMethod::Get => 3,
        HttpMethod::Post => 2,
        HttpMethod::Put | HttpMethod::Patch => 1,
        HttpMethod::Delete | HttpMethod::Head | HttpMethod::Options => 0,
    }
}

/// Lowercase, with every run of non-alphanumerics collapsed to `_`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

pub struct Categorizer<'a> {
    config: &'a AnalysisConfig,
    /// (keyword slug, category) in rule-table order.
    keywords: Vec<(String, &'a str)>,
}

impl<'a> Categorizer<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        let keywords = config
            .category_rules
            .iter()
            .flat_map(|rule| {
                rule.keywords
                    .iter()
                    .map(move |keyword| (slugify(keyword), rule.category.as_str()))
            })
            .filter(|(slug, _)| !slug.is_empty())
            .collect();
        Self { config, keywords }
    }

    pub fn categorize(&self, endpoint: &Endpoint) -> Categorization {
        if let Some(tag) = endpoint
            .tags
            .iter()
            .map(|tag| slugify(tag))
            .find(|slug| !slug.is_empty())
        {
            return Categorization {
                category: self.category_for_tag(&tag),
                source: CategorySource::Tag,
            };
        }
        if let Some(category) = endpoint
            .source_category
            .as_deref()
            .and_then(|parent| self.longest_keyword(&slugify(parent)))
        {
            return Categorization {
                category: category.to_string(),
                source: CategorySource::ParentName,
            };
        }
        self.categorize_path(&endpoint.normalized_path)
    }

    /// Rules 3 and 4 only; used for corpus keys, which carry no tags or folders.
    pub fn categorize_path(&self, normalized_path: &str) -> Categorization {
        match self.longest_keyword(&slugify(normalized_path)) {
            Some(category) => Categorization {
                category: category.to_string(),
                source: CategorySource::PathKeyword,
            },
            None => Categorization {
                category: self.config.default_category.clone(),
                source: CategorySource::Default,
            },
        }
    }

    pub fn score(&self, endpoint: &Endpoint, category: &str) -> i32 {
        let label = endpoint.label().to_lowercase();
        let bonus: i32 = self
            .config
            .keyword_bonuses
            .iter()
            .filter(|(keyword, _)| label.contains(keyword.to_lowercase().as_str()))
            .map(|(_, bonus)| *bonus)
            .sum();
        method_weight(endpoint.method)
            + self
                .config
                .category_weights
                .get(category)
                .copied()
                .unwrap_or(0)
            + bonus
    }

    pub fn apply(&self, endpoint: Endpoint) -> CategorizedEndpoint {
        let categorization = self.categorize(&endpoint);
        let priority_score = self.score(&endpoint, &categorization.category);
        CategorizedEndpoint {
            endpoint,
            category: categorization.category,
            category_source: categorization.source,
            priority_score,
            priority: Priority::from_score(priority_score),
        }
    }

    /// Exact keyword or category name first, then the longest keyword inside
    /// the tag, so "Edge Applications" joins `edge_application` rather than
    /// starting a category of its own.
    fn category_for_tag(&self, tag_slug: &str) -> String {
        self.keywords
            .iter()
            .find(|(keyword, category)| keyword == tag_slug || *category == tag_slug)
            .map(|(_, category)| *category)
            .or_else(|| self.longest_keyword(tag_slug))
            .map_or_else(|| tag_slug.to_string(), str::to_string)
    }

    /// Longest keyword contained in `haystack`; ties go to the earlier rule.
    fn longest_keyword(&self, haystack: &str) -> Option<&'a str> {
        let mut best: Option<(usize, &'a str)> = None;
        for (keyword, category) in &self.keywords {
            if !haystack.contains(keyword.as_str()) {
                continue;
            }
            let longer = match best {
                Some((len, _)) => keyword.len() > len,
                None => true,
            };
            if longer {
                best = Some((keyword.len(), *category));
            }
        }
        best.map(|(_, category)| category)
    }
}

#[cfg(test)]
#[path = "categorize_tests.rs"]
mod tests;
