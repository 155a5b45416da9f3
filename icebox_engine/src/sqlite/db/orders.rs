use chrono::{DateTime, Utc};
use icebox_common::Money;
use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use super::{customers, drivers};
use crate::{
    db_types::{Order, OrderId, OrderStatus, OrderUpdate},
    order_objects::{FullOrder, OrderLine, OrderQueryFilter},
};

/// Inserts a new order row with status `PENDING` and no driver, then derives the unique order
/// number from the fresh row id. Both statements must run inside the caller's transaction so that
/// no order is ever visible without its number.
pub async fn insert_order(
    customer_id: i64,
    delivery_address: &str,
    notes: Option<&str>,
    total: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO orders (customer_id, total, delivery_address, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id;
        "#,
    )
    .bind(customer_id)
    .bind(total)
    .bind(delivery_address)
    .bind(notes)
    .fetch_one(&mut *conn)
    .await?;
    let order: Order =
        sqlx::query_as("UPDATE orders SET order_number = printf('ORD-%06d', id) WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_one(conn)
            .await?;
    debug!("🗃️ Order [{}] inserted with id {}", order.order_number, order.id);
    Ok(order)
}

/// Inserts one order line. The unit price is the caller's snapshot of the catalog price, taken in
/// the same transaction as the stock reservation.
pub async fn insert_order_item(
    order_id: OrderId,
    product_id: i64,
    quantity: i64,
    unit_price: Money,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)")
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// The order's item lines joined with the product names they were taken from.
pub async fn fetch_order_lines(id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    let lines = sqlx::query_as(
        r#"
            SELECT oi.id, oi.product_id, p.name AS product_name, oi.quantity, oi.unit_price
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id;
        "#,
    )
    .bind(id)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

/// Hydrates an order row into the full aggregate: customer, item lines and bound driver.
pub async fn fetch_full_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<FullOrder>, sqlx::Error> {
    let Some(order) = fetch_order(id, &mut *conn).await? else {
        return Ok(None);
    };
    hydrate_order(order, conn).await.map(Some)
}

/// As [`fetch_full_order`], starting from a row that has already been fetched.
pub async fn hydrate_order(order: Order, conn: &mut SqliteConnection) -> Result<FullOrder, sqlx::Error> {
    let customer =
        customers::fetch_customer(order.customer_id, &mut *conn).await?.ok_or(sqlx::Error::RowNotFound)?;
    let items = fetch_order_lines(order.id, &mut *conn).await?;
    let driver = match order.driver_id {
        Some(driver_id) => {
            let driver = drivers::fetch_driver(driver_id, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
            Some(driver.into())
        },
        None => None,
    };
    Ok(FullOrder { order, customer, items, driver })
}

/// Atomically claims a `PENDING`, unassigned order for a driver. The status and assignment checks
/// are part of the UPDATE itself, so two drivers racing for the same order resolve at the database:
/// exactly one update affects a row. Returns `false` when the claim lost.
pub async fn claim_order(id: OrderId, driver_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders
            SET status = 'IN_PROGRESS', driver_id = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'PENDING' AND driver_id IS NULL;
        "#,
    )
    .bind(driver_id)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Marks an `IN_PROGRESS` order delivered, conditional on the given driver being the one bound to
/// it. Returns `false` when no row matched.
pub async fn deliver_order(id: OrderId, driver_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders
            SET status = 'DELIVERED', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'IN_PROGRESS' AND driver_id = $2;
        "#,
    )
    .bind(id)
    .bind(driver_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Cancels a `PENDING` or `IN_PROGRESS` order, clearing any driver assignment and appending the
/// audit line to the order notes. Returns `false` when no row matched. Stock restoration is the
/// caller's responsibility, inside the same transaction.
pub async fn cancel_order(id: OrderId, audit_note: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders
            SET status = 'CANCELLED',
                driver_id = NULL,
                notes = CASE WHEN notes IS NULL OR notes = '' THEN $1 ELSE notes || char(10) || $1 END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status IN ('PENDING', 'IN_PROGRESS');
        "#,
    )
    .bind(audit_note)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Applies the given field edits directly. Lifecycle and invariant checks belong to the caller;
/// this function only writes.
pub async fn update_order(id: OrderId, update: &OrderUpdate, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP");
    if let Some(status) = update.status {
        builder.push(", status = ");
        builder.push_bind(status);
    }
    if let Some(driver_id) = update.driver_id {
        builder.push(", driver_id = ");
        builder.push_bind(driver_id);
    }
    if let Some(notes) = &update.notes {
        builder.push(", notes = ");
        builder.push_bind(notes.clone());
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    let order = builder.build_query_as().fetch_one(conn).await?;
    Ok(order)
}

/// Removes the order and its items. The caller has already verified the order is `PENDING` and
/// restored its stock.
pub async fn delete_order(id: OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(id).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(conn).await?;
    Ok(())
}

/// The claimable set: `PENDING`, unassigned, created at or after the cutoff, newest first.
/// `datetime()` normalises the RFC3339 bind to the storage format of `CURRENT_TIMESTAMP`.
pub async fn available_orders(cutoff: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE status = 'PENDING' AND driver_id IS NULL AND created_at >= datetime($1)
            ORDER BY created_at DESC;
        "#,
    )
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Fetches orders according to the criteria in the `OrderQueryFilter`, newest first.
pub async fn search_orders(filter: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if !filter.statuses.is_empty() {
        // Statuses come from a closed enum, so inlining them is safe.
        let list = filter.statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(", ");
        where_clause.push(format!("status IN ({list})"));
    }
    if let Some(customer_id) = filter.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if let Some(driver_id) = filter.driver_id {
        where_clause.push("driver_id = ");
        where_clause.push_bind_unseparated(driver_id);
    }
    if let Some(order_id) = filter.order_id {
        where_clause.push("id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    if let Some(search) = filter.search {
        where_clause.push("order_number LIKE ");
        where_clause.push_bind_unseparated(format!("%{search}%"));
    }
    if let Some(since) = filter.since {
        where_clause.push("created_at >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = filter.until {
        where_clause.push("created_at <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at DESC");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    if let Some(offset) = filter.offset {
        builder.push(" OFFSET ");
        builder.push_bind(offset);
    }
    let orders = builder.build_query_as().fetch_all(conn).await?;
    Ok(orders)
}

/// Orders bound to the driver, optionally filtered by status, newest first.
pub async fn orders_for_driver(
    driver_id: i64,
    statuses: &[OrderStatus],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE driver_id = ");
    builder.push_bind(driver_id);
    if !statuses.is_empty() {
        let list = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(", ");
        builder.push(format!(" AND status IN ({list})"));
    }
    builder.push(" ORDER BY created_at DESC");
    let orders = builder.build_query_as().fetch_all(conn).await?;
    Ok(orders)
}

/// The number of `IN_PROGRESS` orders bound to the driver. Used to guard driver deletion.
pub async fn driver_active_order_count(driver_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE driver_id = $1 AND status = 'IN_PROGRESS'")
        .bind(driver_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// The number of orders, in any state, referencing the driver. A non-zero count blocks deletion
/// because order history keeps its driver foreign key.
pub async fn driver_order_count(driver_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE driver_id = $1")
        .bind(driver_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// The number of orders owned by the customer. Used to guard customer deletion.
pub async fn customer_order_count(customer_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// The number of order items referencing the product. Used to guard product deletion.
pub async fn product_reference_count(product_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}
