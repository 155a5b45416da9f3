use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Category, NewProduct, Product, ProductUpdate},
    order_objects::ProductQueryFilter,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (name, description, price, stock, image_url, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.image_url)
    .bind(product.category_id)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product [{}] inserted with id {}", product.name, product.id);
    Ok(product)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn update_product(
    id: i64,
    update: &ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Product, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP");
    if let Some(name) = &update.name {
        builder.push(", name = ");
        builder.push_bind(name.clone());
    }
    if let Some(description) = &update.description {
        builder.push(", description = ");
        builder.push_bind(description.clone());
    }
    if let Some(price) = update.price {
        builder.push(", price = ");
        builder.push_bind(price);
    }
    if let Some(image_url) = &update.image_url {
        builder.push(", image_url = ");
        builder.push_bind(image_url.clone());
    }
    if let Some(is_active) = update.is_active {
        builder.push(", is_active = ");
        builder.push_bind(is_active);
    }
    if let Some(category_id) = update.category_id {
        builder.push(", category_id = ");
        builder.push_bind(category_id);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    let product = builder.build_query_as().fetch_one(conn).await?;
    Ok(product)
}

pub async fn delete_product(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

/// Fetches products according to the criteria in the `ProductQueryFilter`, name order.
pub async fn search_products(
    filter: ProductQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM products WHERE 1 = 1");
    if let Some(category_id) = filter.category_id {
        builder.push(" AND category_id = ");
        builder.push_bind(category_id);
    }
    if let Some(search) = filter.search {
        builder.push(" AND name LIKE ");
        builder.push_bind(format!("%{search}%"));
    }
    if filter.active_only {
        builder.push(" AND is_active = TRUE");
    }
    builder.push(" ORDER BY name");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    if let Some(offset) = filter.offset {
        builder.push(" OFFSET ");
        builder.push_bind(offset);
    }
    let products = builder.build_query_as().fetch_all(conn).await?;
    Ok(products)
}

/// Decrements the product's stock by `quantity`, conditional on enough stock being present at the
/// moment of the update. Returns `false` when the decrement would go negative, leaving the row
/// untouched. Callers run this inside the order transaction so a failed line rolls the whole order
/// back.
pub async fn reserve_stock(product_id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE products
            SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND stock >= $1;
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Returns `quantity` units of the product to stock. The inverse of [`reserve_stock`], run inside
/// cancellation and deletion transactions.
pub async fn release_stock(product_id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(quantity)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}

//--------------------------------------     Categories     ---------------------------------------------------------

pub async fn insert_category(
    name: &str,
    description: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Category, sqlx::Error> {
    let category = sqlx::query_as("INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING *")
        .bind(name)
        .bind(description)
        .fetch_one(conn)
        .await?;
    Ok(category)
}

pub async fn fetch_category(id: i64, conn: &mut SqliteConnection) -> Result<Option<Category>, sqlx::Error> {
    let category = sqlx::query_as("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(category)
}

pub async fn fetch_categories(conn: &mut SqliteConnection) -> Result<Vec<Category>, sqlx::Error> {
    let categories = sqlx::query_as("SELECT * FROM categories ORDER BY name").fetch_all(conn).await?;
    Ok(categories)
}

pub async fn delete_category(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

/// The number of products still referencing the category. Used to guard category deletion.
pub async fn category_product_count(id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}
