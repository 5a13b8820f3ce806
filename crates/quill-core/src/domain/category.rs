use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text;
use crate::error::DomainError;

const NAME_MAX: usize = 50;
const DESCRIPTION_MAX: usize = 200;
const ICON_MAX: usize = 50;

pub const DEFAULT_COLOR: &str = "#3B82F6";

/// Categories every fresh install starts with: name, description, color.
pub const DEFAULT_CATEGORIES: [(&str, &str, &str); 8] = [
    ("Technology", "Latest tech news, tutorials, and insights", "#3B82F6"),
    ("Lifestyle", "Life tips, wellness, and personal development", "#10B981"),
    ("Travel", "Travel guides, destinations, and experiences", "#8B5CF6"),
    ("Food", "Recipes, restaurant reviews, and culinary adventures", "#F59E0B"),
    ("Business", "Entrepreneurship, marketing, and business insights", "#6B7280"),
    ("Health", "Fitness, nutrition, and wellness topics", "#EF4444"),
    ("Education", "Learning resources and educational content", "#06B6D4"),
    ("Entertainment", "Movies, music, books, and entertainment", "#EC4899"),
];

/// Category entity. Posts refer to it by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub is_active: bool,
    pub post_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category.
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

impl Category {
    pub fn new(input: NewCategory) -> Result<Self, DomainError> {
        let name = text::required("name", &input.name, NAME_MAX)?;
        let color = match input.color.map(|c| c.trim().to_string()) {
            Some(c) if c.is_empty() => DEFAULT_COLOR.to_string(),
            Some(c) if !text::is_valid_color(&c) => {
                return Err(DomainError::Validation(format!(
                    "color must be a hex value like {DEFAULT_COLOR}"
                )));
            }
            Some(c) => c,
            None => DEFAULT_COLOR.to_string(),
        };

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            slug: text::slugify(&name),
            name,
            description: text::optional("description", input.description, DESCRIPTION_MAX)?,
            color,
            icon: text::optional("icon", input.icon, ICON_MAX)?,
            is_active: input.is_active.unwrap_or(true),
            post_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// The [`DEFAULT_CATEGORIES`] as entities.
    pub fn defaults() -> Vec<Self> {
        DEFAULT_CATEGORIES
            .iter()
            .filter_map(|(name, description, color)| {
                Self::new(NewCategory {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    color: Some(color.to_string()),
                    ..Default::default()
                })
                .ok()
            })
            .collect()
    }
}
