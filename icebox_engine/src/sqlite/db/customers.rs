use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{Customer, CustomerUpdate, NewCustomer};

pub async fn insert_customer(customer: NewCustomer, conn: &mut SqliteConnection) -> Result<Customer, sqlx::Error> {
    let customer: Customer = sqlx::query_as(
        r#"
            INSERT INTO customers (first_name, last_name, email, phone, address, city, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(customer.first_name)
    .bind(customer.last_name)
    .bind(customer.email)
    .bind(customer.phone)
    .bind(customer.address)
    .bind(customer.city)
    .bind(customer.postal_code)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Customer [{}] inserted with id {}", customer.email, customer.id);
    Ok(customer)
}

/// Returns the customer with the given email, creating one from `customer` if none exists. The
/// first mobile order from a new email address registers the customer implicitly.
pub async fn fetch_or_create_customer(
    customer: NewCustomer,
    conn: &mut SqliteConnection,
) -> Result<Customer, sqlx::Error> {
    match fetch_customer_by_email(&customer.email, &mut *conn).await? {
        Some(existing) => Ok(existing),
        None => insert_customer(customer, conn).await,
    }
}

pub async fn fetch_customer(id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(customer)
}

pub async fn fetch_customer_by_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as("SELECT * FROM customers WHERE email = $1")
        .bind(email.trim().to_ascii_lowercase())
        .fetch_optional(conn)
        .await?;
    Ok(customer)
}

pub async fn update_customer(
    id: i64,
    update: &CustomerUpdate,
    conn: &mut SqliteConnection,
) -> Result<Customer, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE customers SET updated_at = CURRENT_TIMESTAMP");
    if let Some(first_name) = &update.first_name {
        builder.push(", first_name = ");
        builder.push_bind(first_name.clone());
    }
    if let Some(last_name) = &update.last_name {
        builder.push(", last_name = ");
        builder.push_bind(last_name.clone());
    }
    if let Some(email) = &update.email {
        builder.push(", email = ");
        builder.push_bind(email.clone());
    }
    if let Some(phone) = &update.phone {
        builder.push(", phone = ");
        builder.push_bind(phone.clone());
    }
    if let Some(address) = &update.address {
        builder.push(", address = ");
        builder.push_bind(address.clone());
    }
    if let Some(city) = &update.city {
        builder.push(", city = ");
        builder.push_bind(city.clone());
    }
    if let Some(postal_code) = &update.postal_code {
        builder.push(", postal_code = ");
        builder.push_bind(postal_code.clone());
    }
    if let Some(is_active) = update.is_active {
        builder.push(", is_active = ");
        builder.push_bind(is_active);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    let customer = builder.build_query_as().fetch_one(conn).await?;
    Ok(customer)
}

pub async fn delete_customer(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_customers(limit: i64, offset: i64, conn: &mut SqliteConnection) -> Result<Vec<Customer>, sqlx::Error> {
    let customers = sqlx::query_as("SELECT * FROM customers ORDER BY created_at DESC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(customers)
}
