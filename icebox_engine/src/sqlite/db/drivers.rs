use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{Driver, DriverUpdate, NewDriver};

pub async fn insert_driver(driver: NewDriver, conn: &mut SqliteConnection) -> Result<Driver, sqlx::Error> {
    let driver: Driver = sqlx::query_as(
        r#"
            INSERT INTO drivers (
                first_name,
                last_name,
                email,
                password_hash,
                phone,
                vehicle_type,
                license_plate,
                vehicle_color
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(driver.first_name)
    .bind(driver.last_name)
    .bind(driver.email)
    .bind(driver.password_hash)
    .bind(driver.phone)
    .bind(driver.vehicle_type)
    .bind(driver.license_plate)
    .bind(driver.vehicle_color)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Driver [{}] inserted with id {}", driver.email, driver.id);
    Ok(driver)
}

pub async fn fetch_driver(id: i64, conn: &mut SqliteConnection) -> Result<Option<Driver>, sqlx::Error> {
    let driver = sqlx::query_as("SELECT * FROM drivers WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(driver)
}

pub async fn fetch_driver_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Driver>, sqlx::Error> {
    let driver = sqlx::query_as("SELECT * FROM drivers WHERE email = $1")
        .bind(email.trim().to_ascii_lowercase())
        .fetch_optional(conn)
        .await?;
    Ok(driver)
}

pub async fn set_driver_online(id: i64, online: bool, conn: &mut SqliteConnection) -> Result<Option<Driver>, sqlx::Error> {
    let driver = sqlx::query_as(
        "UPDATE drivers SET is_online = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(online)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(driver)
}

/// Applies the given field edits directly. The caller has already confirmed the driver exists.
pub async fn update_driver(id: i64, update: &DriverUpdate, conn: &mut SqliteConnection) -> Result<Driver, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE drivers SET updated_at = CURRENT_TIMESTAMP");
    if let Some(first_name) = &update.first_name {
        builder.push(", first_name = ");
        builder.push_bind(first_name.clone());
    }
    if let Some(last_name) = &update.last_name {
        builder.push(", last_name = ");
        builder.push_bind(last_name.clone());
    }
    if let Some(phone) = &update.phone {
        builder.push(", phone = ");
        builder.push_bind(phone.clone());
    }
    if let Some(vehicle_type) = &update.vehicle_type {
        builder.push(", vehicle_type = ");
        builder.push_bind(vehicle_type.clone());
    }
    if let Some(license_plate) = &update.license_plate {
        builder.push(", license_plate = ");
        builder.push_bind(license_plate.clone());
    }
    if let Some(vehicle_color) = &update.vehicle_color {
        builder.push(", vehicle_color = ");
        builder.push_bind(vehicle_color.clone());
    }
    if let Some(verified) = update.is_verified {
        builder.push(", is_verified = ");
        builder.push_bind(verified);
    }
    if let Some(active) = update.is_active {
        builder.push(", is_active = ");
        builder.push_bind(active);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    let driver = builder.build_query_as().fetch_one(conn).await?;
    Ok(driver)
}

pub async fn delete_driver(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM drivers WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_drivers(limit: i64, offset: i64, conn: &mut SqliteConnection) -> Result<Vec<Driver>, sqlx::Error> {
    let drivers = sqlx::query_as("SELECT * FROM drivers ORDER BY created_at DESC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(drivers)
}
