use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{Product, ProductListQuery, ProductRequest, SortColumn, SortDirection},
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn create_product(pool: &PgPool, req: &ProductRequest) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (name, price, description, status, lifecycle, sort)
        VALUES ($1, $2, $3, $4, $5, (SELECT COALESCE(MAX(sort), 0) + 1 FROM products))
        RETURNING *
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.price)
    .bind(req.description_value())
    .bind(req.status.unwrap_or(true))
    .bind(req.lifecycle_value())
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn update_product(pool: &PgPool, id: i32, req: &ProductRequest) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET
            name = COALESCE($1, name),
            price = COALESCE($2, price),
            description = CASE WHEN $3 THEN $4 ELSE description END,
            status = COALESCE($5, status),
            lifecycle = CASE WHEN $6 THEN $7 ELSE lifecycle END,
            updated_at = NOW()
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.price)
    .bind(req.description.is_some())
    .bind(req.description_value())
    .bind(req.status)
    .bind(req.lifecycle.is_some())
    .bind(req.lifecycle_value())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn delete_product(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let deleted = sqlx::query_as::<_, Product>("DELETE FROM products WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(deleted)
}

pub async fn delete_products(pool: &PgPool, ids: &[i32]) -> Result<Vec<Product>> {
    let deleted =
        sqlx::query_as::<_, Product>("DELETE FROM products WHERE id = ANY($1) RETURNING *")
            .bind(ids)
            .fetch_all(pool)
            .await?;

    Ok(deleted)
}

/// Assigns `sort` = 1-based position in `ids`. Unknown ids are skipped.
pub async fn reorder_products(pool: &PgPool, ids: &[i32]) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE products AS p
        SET sort = o.position::INT, updated_at = NOW()
        FROM UNNEST($1::INT[]) WITH ORDINALITY AS o(id, position)
        WHERE p.id = o.id
        "#,
    )
    .bind(ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn append_images(pool: &PgPool, id: i32, keys: &[String]) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET image = image || $2::TEXT[], updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(keys)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn remove_image(pool: &PgPool, id: i32, key: &str) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET image = array_remove(image, $2), updated_at = NOW()
        WHERE id = $1 AND $2 = ANY(image)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub fn order_clause(sort_by: Option<SortColumn>, direction: Option<SortDirection>) -> String {
    match sort_by {
        Some(column) => {
            let direction = direction.unwrap_or(SortDirection::Asc);
            format!(" ORDER BY {} {}, id ASC", column.column(), direction.keyword())
        }
        None => " ORDER BY created_at DESC, id DESC".to_string(),
    }
}

pub fn page_bounds(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let per_page = per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = page.unwrap_or(1).max(1);
    // Past-the-end pages just come back empty.
    let offset = (page - 1).saturating_mul(per_page);

    (page, per_page, offset)
}

pub async fn search_products(pool: &PgPool, params: &ProductListQuery) -> Result<(Vec<Product>, i64)> {
    let (_, per_page, offset) = page_bounds(params.page, params.per_page);

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT *, COUNT(*) OVER() AS total_count FROM products WHERE 1=1");

    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query_builder.push(" AND name ILIKE ");
        query_builder.push_bind(format!("%{}%", search));
    }

    query_builder.push(order_clause(params.sort_by, params.direction));

    query_builder.push(" LIMIT ");
    query_builder.push_bind(per_page);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(offset);

    #[derive(sqlx::FromRow)]
    struct SearchResult {
        #[sqlx(flatten)]
        product: Product,
        total_count: i64,
    }

    let results = query_builder
        .build_query_as::<SearchResult>()
        .fetch_all(pool)
        .await?;

    let total = results.first().map(|r| r.total_count).unwrap_or(0);
    let products = results.into_iter().map(|r| r.product).collect();

    Ok((products, total))
}
