use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, Page, PageRequest, Sort, SortDirection, SortField};
use domain::{Customer, CustomerStore, Money, Order, OrderItem, OrderStore, StoreError, StoreResult};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn order_from_row(row: &PgRow) -> StoreResult<Order> {
        let order_id: i64 = row.try_get("order_id")?;
        let customer_id: i64 = row.try_get("customer_id")?;
        let total_amount: Decimal = row.try_get("total_amount")?;
        let items_count: i32 = row.try_get("items_count")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        Ok(Order::from_stored(
            OrderId::new(order_id),
            CustomerId::new(customer_id),
            Money::new(total_amount),
            items_count as u32,
            created_at,
            Vec::new(),
        ))
    }

    fn item_from_row(row: &PgRow) -> StoreResult<OrderItem> {
        let item_id: i64 = row.try_get("item_id")?;
        let product: String = row.try_get("product")?;
        let quantity: Option<i32> = row.try_get("quantity")?;
        let price: Option<Decimal> = row.try_get("price")?;

        let mut item = OrderItem::new(
            product,
            quantity.map(|q| q as u32),
            price.map(Money::new),
        );
        item.set_item_id(item_id);
        Ok(item)
    }

    async fn load_items(&self, order_id: OrderId) -> StoreResult<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, product, quantity, price
            FROM order_items
            WHERE order_id = $1
            ORDER BY item_id ASC
            "#,
        )
        .bind(order_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::item_from_row).collect()
    }

    fn order_clause(sort: Sort) -> &'static str {
        match (sort.field, sort.direction) {
            (SortField::CreatedAt, SortDirection::Ascending) => "created_at ASC",
            (SortField::CreatedAt, SortDirection::Descending) => "created_at DESC",
            (SortField::OrderId, SortDirection::Ascending) => "order_id ASC",
            (SortField::OrderId, SortDirection::Descending) => "order_id DESC",
        }
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn exists(&self, order_id: OrderId) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE order_id = $1)")
                .bind(order_id.get())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn save(&self, order: &Order, customer: &Customer) -> StoreResult<Order> {
        let order_id = order.order_id().ok_or(StoreError::MissingIdentity)?;
        let customer_id = customer.customer_id().ok_or(StoreError::MissingIdentity)?;

        // The order and its customer relationship become visible together
        // or not at all.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO customers (customer_id) VALUES ($1) ON CONFLICT (customer_id) DO NOTHING",
        )
        .bind(customer_id.get())
        .execute(&mut *tx)
        .await?;

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO orders (order_id, customer_id, total_amount, items_count)
            VALUES ($1, $2, $3, $4)
            RETURNING created_at
            "#,
        )
        .bind(order_id.get())
        .bind(customer_id.get())
        .bind(order.total_amount().amount())
        .bind(order.items_count() as i32)
        .fetch_one(&mut *tx)
        .await?;

        let mut saved = order.clone();
        saved.set_created_at(created_at);

        for item in saved.items_mut() {
            let item_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO order_items (order_id, product, quantity, price, total_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING item_id
                "#,
            )
            .bind(order_id.get())
            .bind(item.product())
            .bind(item.quantity().map(|q| q as i32))
            .bind(item.price().map(|p| p.amount()))
            .bind(item.total_price().amount())
            .fetch_one(&mut *tx)
            .await?;
            item.set_item_id(item_id);
        }

        tx.commit().await?;
        Ok(saved)
    }

    async fn find_by_id(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, customer_id, total_amount, items_count, created_at
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::order_from_row).transpose()
    }

    async fn find_by_id_with_items(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        let Some(mut order) = OrderStore::find_by_id(self, order_id).await? else {
            return Ok(None);
        };
        order.set_items(self.load_items(order_id).await?);
        Ok(Some(order))
    }

    async fn find_by_customer_id(
        &self,
        customer_id: CustomerId,
        request: PageRequest,
    ) -> StoreResult<Page<Order>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(customer_id.get())
            .fetch_one(&self.pool)
            .await?;

        let sort = request.sort().unwrap_or_else(Sort::created_at_descending);
        let sql = format!(
            r#"
            SELECT order_id, customer_id, total_amount, items_count, created_at
            FROM orders
            WHERE customer_id = $1
            ORDER BY {}
            LIMIT $2 OFFSET $3
            "#,
            Self::order_clause(sort)
        );

        let rows = sqlx::query(&sql)
            .bind(customer_id.get())
            .bind(i64::from(request.size()))
            .bind(request.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let content: Vec<Order> = rows
            .iter()
            .map(Self::order_from_row)
            .collect::<StoreResult<_>>()?;

        Ok(Page::new(content, total as u64, request))
    }

    async fn count_by_customer_id(&self, customer_id: CustomerId) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(customer_id.get())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl CustomerStore for PostgresStore {
    async fn find_by_id(&self, customer_id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query("SELECT created_at FROM customers WHERE customer_id = $1")
            .bind(customer_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| {
            let mut customer = Customer::new(customer_id);
            if let Ok(created_at) = row.try_get::<DateTime<Utc>, _>("created_at") {
                customer.set_created_at(created_at);
            }
            customer
        }))
    }

    async fn find_by_id_with_orders(
        &self,
        customer_id: CustomerId,
    ) -> StoreResult<Option<Customer>> {
        let Some(base) = CustomerStore::find_by_id(self, customer_id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r#"
            SELECT order_id, customer_id, total_amount, items_count, created_at
            FROM orders
            WHERE customer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id.get())
        .fetch_all(&self.pool)
        .await?;

        let orders: Vec<Order> = rows
            .iter()
            .map(Self::order_from_row)
            .collect::<StoreResult<_>>()?;

        let mut customer = Customer::with_orders(customer_id, orders);
        if let Some(created_at) = base.created_at() {
            customer.set_created_at(created_at);
        }
        Ok(Some(customer))
    }

    async fn save(&self, customer: &Customer) -> StoreResult<Customer> {
        let customer_id = customer.customer_id().ok_or(StoreError::MissingIdentity)?;

        // Idempotent by identity: a conflicting insert is a successful
        // no-op returning the existing row. The DO UPDATE arm is a no-op
        // write that makes RETURNING yield the row on conflict.
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO customers (customer_id)
            VALUES ($1)
            ON CONFLICT (customer_id) DO UPDATE SET customer_id = EXCLUDED.customer_id
            RETURNING created_at
            "#,
        )
        .bind(customer_id.get())
        .fetch_one(&self.pool)
        .await?;

        let mut saved = customer.clone();
        saved.set_created_at(created_at);
        Ok(saved)
    }

    async fn count_orders_by_customer_id(&self, customer_id: CustomerId) -> StoreResult<u64> {
        OrderStore::count_by_customer_id(self, customer_id).await
    }
}
