use serde::Deserialize;

/// A post row with its embedded category, as returned by PostgREST
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Raw HTML body
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub categories: Option<Category>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Category {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl Article {
    pub fn excerpt(&self) -> &str {
        self.excerpt.as_deref().unwrap_or_default()
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn image_url(&self) -> &str {
        self.image_url.as_deref().unwrap_or_default()
    }

    /// Label shown in the category tag
    pub fn category_name(&self) -> &str {
        self.categories
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or("Article")
    }

    /// Link from the category tag back to the filtered index
    pub fn category_href(&self) -> String {
        match self.categories.as_ref().and_then(|c| c.slug.as_deref()) {
            Some(slug) if !slug.is_empty() => format!("/index.html?categories={slug}"),
            _ => "/index.html".to_string(),
        }
    }
}
