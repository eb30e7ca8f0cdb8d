//! Service catalog entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::truncate_string;

/// A service offered by the company, as listed by `GET /services/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    /// Decimal price, serialized by the backend as a string
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Service {
    /// One-line summary, falling back to a shortened description.
    pub fn summary(&self, max_len: usize) -> String {
        match self.short_description.as_deref() {
            Some(short) if !short.trim().is_empty() => truncate_string(short.trim(), max_len),
            _ => truncate_string(self.description.trim(), max_len),
        }
    }

    pub fn price_display(&self) -> String {
        match self.price.as_deref() {
            Some(price) if !price.is_empty() => format!("${}", price),
            _ => "Contact us".to_string(),
        }
    }
}
