//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation(field)` |
//! | Database (other) | any | `Backend` |
//! | PoolClosed / Io / other | n/a | `Backend` |
//! | Row decode failure | n/a | `Corrupt` |
//!
//! Unique violations carry the logical field name derived from the constraint
//! (`order_number`, `email`, `phone`) so callers can react without knowing
//! index names.
//!
//! ## Locking
//!
//! Status and payment updates load the order with `SELECT ... FOR UPDATE`
//! inside the unit-of-work transaction. The `version` column is also checked
//! on update, so a writer that bypasses the lock still cannot clobber a newer
//! row.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};

use lustre_auth::Role;
use lustre_core::{ExpectedVersion, OrderId, ProductId, UserId};
use lustre_orders::{
    NewOrder, NewTrackingEntry, Order, OrderLineItem, OrderNumber, ShippingAddress,
    TrackingEntry,
};

use super::query::{OrderFilter, Page, Pagination};
use super::r#trait::{
    Account, AccountStore, NewAccount, OrderStore, OrderTx, StoreError, TrackingStore,
};

/// Schema applied by [`ensure_schema`]. Every statement is idempotent.
pub const SCHEMA: &str = include_str!("../../migrations/0001_orders.sql");

/// Create tables and indexes if they do not exist yet.
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    Ok(())
}

const ORDER_COLUMNS: &str = r#"
    id, order_number, customer_id, channel, subtotal, shipping_cost, total,
    status, payment_method, payment_status,
    shipping_name, shipping_phone, shipping_email, shipping_address,
    shipping_city, shipping_state, shipping_zip,
    notes, version, created_at, updated_at
"#;

/// Postgres-backed order store (orders, order_items, order_tracking).
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: Arc<PgPool>,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

struct PgOrderTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTx for PgOrderTx {
    #[instrument(skip(self, order), fields(order_number = %order.order_number), err)]
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (
                order_number, customer_id, channel, subtotal, shipping_cost, total,
                status, payment_method, payment_status,
                shipping_name, shipping_phone, shipping_email, shipping_address,
                shipping_city, shipping_state, shipping_zip,
                notes, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, 1, $18, $18)
            RETURNING id
            "#,
        )
        .bind(order.order_number.as_str())
        .bind(order.customer_id.get())
        .bind(order.channel.as_str())
        .bind(to_db(order.subtotal, "subtotal")?)
        .bind(to_db(order.shipping_cost, "shipping_cost")?)
        .bind(to_db(order.total, "total")?)
        .bind(order.status.as_str())
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.shipping.name)
        .bind(&order.shipping.phone)
        .bind(order.shipping.email.as_deref())
        .bind(&order.shipping.address)
        .bind(&order.shipping.city)
        .bind(order.shipping.state.as_deref())
        .bind(order.shipping.zip.as_deref())
        .bind(order.notes.as_deref())
        .bind(order.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Corrupt(format!("failed to read order id: {e}")))?;

        for (line_no, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, line_no, product_id, name, sku, category, image,
                    metal_type, purity, weight_grams, price, discount_price,
                    quantity, line_total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(id)
            .bind(line_no as i32)
            .bind(item.product_id.get())
            .bind(&item.name)
            .bind(item.sku.as_deref())
            .bind(item.category.as_deref())
            .bind(item.image.as_deref())
            .bind(item.metal_type.as_deref())
            .bind(item.purity.as_deref())
            .bind(item.weight_grams)
            .bind(to_db(item.price, "price")?)
            .bind(item.discount_price.map(|d| to_db(d, "discount_price")).transpose()?)
            .bind(i32::try_from(item.quantity).map_err(|_| {
                StoreError::Backend(format!("quantity {} out of range", item.quantity))
            })?)
            .bind(to_db(item.line_total, "line_total")?)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;
        }

        Ok(order.into_order(OrderId::new(id)))
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("lock_order", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let header = decode::<OrderRow>(&row, "order")?;
        let mut items = load_items(&mut *self.tx, &[header.id]).await?;
        let items = items.remove(&header.id).unwrap_or_default();
        header.into_order(items).map(Some)
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, version = order.version), err)]
    async fn update_order(
        &mut self,
        order: &Order,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let expected_version = match expected {
            ExpectedVersion::Exact(v) => Some(to_db(v, "version")?),
            ExpectedVersion::Any => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, payment_status = $3, updated_at = $4, version = $5
            WHERE id = $1 AND ($6::bigint IS NULL OR version = $6)
            "#,
        )
        .bind(order.id.get())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.updated_at)
        .bind(to_db(order.version, "version")?)
        .bind(expected_version)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Concurrency(format!(
                "order {} is not at {expected:?}",
                order.id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, entry), fields(order_id = %entry.order_id, status = %entry.status), err)]
    async fn append_tracking(
        &mut self,
        entry: NewTrackingEntry,
    ) -> Result<TrackingEntry, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO order_tracking (order_id, status, notes, updated_by, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(entry.order_id.get())
        .bind(entry.status.as_str())
        .bind(&entry.notes)
        .bind(entry.actor.map(|a| a.get()))
        .bind(entry.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("append_tracking", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Corrupt(format!("failed to read tracking id: {e}")))?;

        Ok(TrackingEntry {
            id,
            order_id: entry.order_id,
            status: entry.status,
            notes: entry.notes,
            actor: entry.actor,
            created_at: entry.created_at,
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn begin(&self) -> Result<Box<dyn OrderTx>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PgOrderTx { tx }))
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;

        match row {
            Some(row) => {
                let orders = with_items(&self.pool, vec![decode::<OrderRow>(&row, "order")?]).await?;
                Ok(orders.into_iter().next())
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(customer_id = %customer, order_count = tracing::field::Empty), err)]
    async fn list_for_customer(&self, customer: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(customer.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_customer_orders", e))?;

        let headers = rows
            .iter()
            .map(|r| decode::<OrderRow>(r, "order"))
            .collect::<Result<Vec<_>, _>>()?;
        let orders = with_items(&self.pool, headers).await?;

        Span::current().record("order_count", orders.len());
        Ok(orders)
    }

    #[instrument(skip(self), fields(total = tracing::field::Empty), err)]
    async fn list(
        &self,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> Result<Page<Order>, StoreError> {
        let status = filter.status.map(|s| s.as_str());
        let payment_status = filter.payment_status.map(|p| p.as_str());
        let channel = filter.channel.map(|c| c.as_str());

        let count_row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM orders
            WHERE ($1::text IS NULL OR status = $1)
                AND ($2::text IS NULL OR payment_status = $2)
                AND ($3::text IS NULL OR channel = $3)
            "#,
        )
        .bind(status)
        .bind(payment_status)
        .bind(channel)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_orders", e))?;

        let total: i64 = count_row
            .try_get("total")
            .map_err(|e| StoreError::Corrupt(format!("failed to read count: {e}")))?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::text IS NULL OR status = $1)
                AND ($2::text IS NULL OR payment_status = $2)
                AND ($3::text IS NULL OR channel = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(status)
        .bind(payment_status)
        .bind(channel)
        .bind(i64::from(pagination.limit))
        .bind(to_db(pagination.offset(), "offset")?)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        let headers = rows
            .iter()
            .map(|r| decode::<OrderRow>(r, "order"))
            .collect::<Result<Vec<_>, _>>()?;
        let items = with_items(&self.pool, headers).await?;

        Span::current().record("total", total);
        Ok(Page {
            items,
            total: from_db(total, "total")?,
            page: pagination.page,
            limit: pagination.limit,
        })
    }
}

#[async_trait]
impl TrackingStore for PostgresOrderStore {
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    async fn history(&self, order_id: OrderId) -> Result<Vec<TrackingEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, status, notes, updated_by, created_at
            FROM order_tracking
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("tracking_history", e))?;

        rows.iter()
            .map(|r| decode::<TrackingRow>(r, "tracking entry")?.into_entry())
            .collect()
    }
}

/// Postgres-backed account store (`users` table).
#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: Arc<PgPool>,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn find_one(&self, clause: &str, value: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT id, name, email, phone, password_hash, role, created_at FROM users WHERE {clause}"
        ))
        .bind(value)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_account", e))?;

        row.map(|r| decode::<AccountRow>(&r, "account").map(Account::from))
            .transpose()
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_account", e))?;

        row.map(|r| decode::<AccountRow>(&r, "account").map(Account::from))
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.find_one("email = $1", email).await
    }

    #[instrument(skip(self), err)]
    async fn find_by_phone(&self, phone: &str) -> Result<Option<Account>, StoreError> {
        self.find_one("phone = $1", phone).await
    }

    #[instrument(skip(self, account), fields(email = %account.email), err)]
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, phone, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&account.name)
        .bind(&account.email)
        .bind(account.phone.as_deref())
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_account", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Corrupt(format!("failed to read account id: {e}")))?;

        Ok(Account {
            id: UserId::new(id),
            name: account.name,
            email: account.email,
            phone: account.phone,
            password_hash: account.password_hash,
            role: account.role,
            created_at: account.created_at,
        })
    }
}

/// Load line items for a batch of orders, grouped by order id.
async fn load_items<'e, E>(
    executor: E,
    order_ids: &[i64],
) -> Result<HashMap<i64, Vec<OrderLineItem>>, StoreError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query(
        r#"
        SELECT order_id, product_id, name, sku, category, image, metal_type, purity,
               weight_grams, price, discount_price, quantity, line_total
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY order_id, line_no
        "#,
    )
    .bind(order_ids)
    .fetch_all(executor)
    .await
    .map_err(|e| map_sqlx_error("load_items", e))?;

    let mut grouped: HashMap<i64, Vec<OrderLineItem>> = HashMap::new();
    for row in &rows {
        let item = decode::<ItemRow>(row, "order item")?;
        let order_id = item.order_id;
        grouped.entry(order_id).or_default().push(item.into_item()?);
    }
    Ok(grouped)
}

async fn with_items(pool: &PgPool, headers: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = headers.iter().map(|h| h.id).collect();
    let mut items = load_items(pool, &ids).await?;
    headers
        .into_iter()
        .map(|h| {
            let lines = items.remove(&h.id).unwrap_or_default();
            h.into_order(lines)
        })
        .collect()
}

fn decode<'r, T>(row: &'r PgRow, what: &str) -> Result<T, StoreError>
where
    T: FromRow<'r, PgRow>,
{
    T::from_row(row).map_err(|e| StoreError::Corrupt(format!("failed to decode {what} row: {e}")))
}

fn to_db(value: u64, field: &str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Backend(format!("{field} {value} out of range")))
}

fn from_db(value: i64, field: &str) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {field}: {value}")))
}

fn parse_column<T>(value: &str, column: &str) -> Result<T, StoreError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    value
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("{column}: {e}")))
}

/// Map a unique constraint name to the logical field it protects.
fn unique_field(constraint: Option<&str>) -> String {
    match constraint {
        Some("orders_order_number_key") => "order_number",
        Some("users_email_key") => "email",
        Some("users_phone_key") => "phone",
        Some(other) => other,
        None => "unknown",
    }
    .to_string()
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::UniqueViolation(unique_field(db_err.constraint()));
            }
            StoreError::Backend(format!(
                "database error in {}: {}",
                operation,
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

#[derive(Debug)]
struct OrderRow {
    id: i64,
    order_number: String,
    customer_id: i64,
    channel: String,
    subtotal: i64,
    shipping_cost: i64,
    total: i64,
    status: String,
    payment_method: String,
    payment_status: String,
    shipping_name: String,
    shipping_phone: String,
    shipping_email: Option<String>,
    shipping_address: String,
    shipping_city: String,
    shipping_state: Option<String>,
    shipping_zip: Option<String>,
    notes: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            order_number: row.try_get("order_number")?,
            customer_id: row.try_get("customer_id")?,
            channel: row.try_get("channel")?,
            subtotal: row.try_get("subtotal")?,
            shipping_cost: row.try_get("shipping_cost")?,
            total: row.try_get("total")?,
            status: row.try_get("status")?,
            payment_method: row.try_get("payment_method")?,
            payment_status: row.try_get("payment_status")?,
            shipping_name: row.try_get("shipping_name")?,
            shipping_phone: row.try_get("shipping_phone")?,
            shipping_email: row.try_get("shipping_email")?,
            shipping_address: row.try_get("shipping_address")?,
            shipping_city: row.try_get("shipping_city")?,
            shipping_state: row.try_get("shipping_state")?,
            shipping_zip: row.try_get("shipping_zip")?,
            notes: row.try_get("notes")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderLineItem>) -> Result<Order, StoreError> {
        Ok(Order {
            id: OrderId::new(self.id),
            order_number: OrderNumber::from_stored(self.order_number),
            customer_id: UserId::new(self.customer_id),
            channel: parse_column(&self.channel, "channel")?,
            items,
            subtotal: from_db(self.subtotal, "subtotal")?,
            shipping_cost: from_db(self.shipping_cost, "shipping_cost")?,
            total: from_db(self.total, "total")?,
            status: parse_column(&self.status, "status")?,
            payment_method: parse_column(&self.payment_method, "payment_method")?,
            payment_status: parse_column(&self.payment_status, "payment_status")?,
            shipping: ShippingAddress {
                name: self.shipping_name,
                phone: self.shipping_phone,
                email: self.shipping_email,
                address: self.shipping_address,
                city: self.shipping_city,
                state: self.shipping_state,
                zip: self.shipping_zip,
            },
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: from_db(self.version, "version")?,
        })
    }
}

#[derive(Debug)]
struct ItemRow {
    order_id: i64,
    product_id: i64,
    name: String,
    sku: Option<String>,
    category: Option<String>,
    image: Option<String>,
    metal_type: Option<String>,
    purity: Option<String>,
    weight_grams: Option<f64>,
    price: i64,
    discount_price: Option<i64>,
    quantity: i32,
    line_total: i64,
}

impl<'r> FromRow<'r, PgRow> for ItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            order_id: row.try_get("order_id")?,
            product_id: row.try_get("product_id")?,
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            category: row.try_get("category")?,
            image: row.try_get("image")?,
            metal_type: row.try_get("metal_type")?,
            purity: row.try_get("purity")?,
            weight_grams: row.try_get("weight_grams")?,
            price: row.try_get("price")?,
            discount_price: row.try_get("discount_price")?,
            quantity: row.try_get("quantity")?,
            line_total: row.try_get("line_total")?,
        })
    }
}

impl ItemRow {
    fn into_item(self) -> Result<OrderLineItem, StoreError> {
        Ok(OrderLineItem {
            product_id: ProductId::new(self.product_id),
            name: self.name,
            sku: self.sku,
            category: self.category,
            image: self.image,
            metal_type: self.metal_type,
            purity: self.purity,
            weight_grams: self.weight_grams,
            price: from_db(self.price, "price")?,
            discount_price: self
                .discount_price
                .map(|d| from_db(d, "discount_price"))
                .transpose()?,
            quantity: u32::try_from(self.quantity)
                .map_err(|_| StoreError::Corrupt(format!("negative quantity: {}", self.quantity)))?,
            line_total: from_db(self.line_total, "line_total")?,
        })
    }
}

#[derive(Debug)]
struct TrackingRow {
    id: i64,
    order_id: i64,
    status: String,
    notes: String,
    updated_by: Option<i64>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for TrackingRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TrackingRow {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            status: row.try_get("status")?,
            notes: row.try_get("notes")?,
            updated_by: row.try_get("updated_by")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TrackingRow {
    fn into_entry(self) -> Result<TrackingEntry, StoreError> {
        Ok(TrackingEntry {
            id: self.id,
            order_id: OrderId::new(self.order_id),
            status: parse_column(&self.status, "status")?,
            notes: self.notes,
            actor: self.updated_by.map(UserId::new),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug)]
struct AccountRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for AccountRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            password_hash: row.try_get("password_hash")?,
            role: row.try_get("role")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: UserId::new(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            role: Role::new(row.role),
            created_at: row.created_at,
        }
    }
}
