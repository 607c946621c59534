//! # Query Catalog
//!
//! Browsable metadata for canned heap queries: categories and the queries
//! filed under them. Running the queries is someone else's job; this module
//! only describes them.

use std::fmt;

/// A named group of canned queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryCategory
{
    id: String,
    name: String,
    description: Option<String>,
}

impl QueryCategory
{
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: Option<String>) -> Self
    {
        QueryCategory {
            id: id.into(),
            name: name.into(),
            description,
        }
    }

    /// Stable identifier, used by repositories to file queries.
    #[must_use]
    pub fn id(&self) -> &str
    {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str>
    {
        self.description.as_deref()
    }
}

impl fmt::Display for QueryCategory
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.name)
    }
}

/// One canned query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryDefinition
{
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Query text, handed verbatim to the query engine
    pub script: String,
}

impl fmt::Display for QueryDefinition
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.name)
    }
}

/// Source of categories and queries
///
/// `pattern` arguments match names case-insensitively by substring; an empty
/// pattern matches everything.
pub trait QueryRepository: Send + Sync
{
    /// All categories, in repository order.
    fn list_categories(&self) -> Vec<QueryCategory>;

    /// Categories whose name matches `pattern`.
    fn list_categories_matching(&self, pattern: &str) -> Vec<QueryCategory>
    {
        self.list_categories()
            .into_iter()
            .filter(|category| name_matches(&category.name, pattern))
            .collect()
    }

    /// Queries filed under `category`.
    fn list_queries(&self, category: &QueryCategory) -> Vec<QueryDefinition>;

    /// Queries filed under `category` whose name matches `pattern`.
    fn list_queries_matching(&self, category: &QueryCategory, pattern: &str) -> Vec<QueryDefinition>
    {
        self.list_queries(category)
            .into_iter()
            .filter(|query| name_matches(&query.name, pattern))
            .collect()
    }
}

fn name_matches(name: &str, pattern: &str) -> bool
{
    pattern.is_empty() || name.to_lowercase().contains(&pattern.to_lowercase())
}

/// In-memory [`QueryRepository`]
#[derive(Debug, Clone, Default)]
pub struct StaticQueryRepository
{
    categories: Vec<(QueryCategory, Vec<QueryDefinition>)>,
}

impl StaticQueryRepository
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Add a category with its queries. A category with an id already present
    /// gets the queries appended instead.
    #[must_use]
    pub fn with_category(mut self, category: QueryCategory, queries: Vec<QueryDefinition>) -> Self
    {
        match self.categories.iter_mut().find(|(existing, _)| existing.id == category.id) {
            Some((_, existing)) => existing.extend(queries),
            None => self.categories.push((category, queries)),
        }
        self
    }
}

impl QueryRepository for StaticQueryRepository
{
    fn list_categories(&self) -> Vec<QueryCategory>
    {
        self.categories.iter().map(|(category, _)| category.clone()).collect()
    }

    fn list_queries(&self, category: &QueryCategory) -> Vec<QueryDefinition>
    {
        self.categories
            .iter()
            .find(|(existing, _)| existing.id == category.id)
            .map(|(_, queries)| queries.clone())
            .unwrap_or_default()
    }
}
