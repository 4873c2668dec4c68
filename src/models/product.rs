use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Editorial state used only to style list rows. It is stored next to, and
/// independently of, the boolean `status` toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Draft,
    Reviewing,
    Published,
}

impl Lifecycle {
    pub fn row_class(self) -> &'static str {
        match self {
            Lifecycle::Draft => "opacity-30",
            Lifecycle::Reviewing => "border-s-2 border-orange-600 dark:border-orange-300",
            Lifecycle::Published => "border-s-2 border-green-600 dark:border-green-300",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub status: bool,
    pub lifecycle: Option<Lifecycle>,
    pub image: Vec<String>,
    pub sort: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Request types

/// Keeps "field sent as null" apart from "field not sent": the outer
/// `Option` is presence, the inner one the value.
fn present<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub status: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub lifecycle: Option<Option<Lifecycle>>,
}

impl ProductRequest {
    /// Description to store: blank text is stored as NULL.
    pub fn description_value(&self) -> Option<&str> {
        self.description
            .as_ref()
            .and_then(|d| d.as_deref())
            .filter(|d| !d.trim().is_empty())
    }

    pub fn lifecycle_value(&self) -> Option<Lifecycle> {
        self.lifecycle.flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Name,
    Price,
    Status,
    CreatedAt,
    Sort,
}

impl SortColumn {
    pub fn column(self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Price => "price",
            SortColumn::Status => "status",
            SortColumn::CreatedAt => "created_at",
            SortColumn::Sort => "sort",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub sort_by: Option<SortColumn>,
    pub direction: Option<SortDirection>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i32>,
}

// Response types

/// A product as shown in the list view, with its display-only columns resolved.
#[derive(Debug, Serialize)]
pub struct ProductRow {
    #[serde(flatten)]
    pub product: Product,
    pub price_display: String,
    pub row_class: Option<&'static str>,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub data: Vec<ProductRow>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub last_page: i64,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub updated: u64,
}
