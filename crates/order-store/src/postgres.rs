use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use domain::{
    Customer, NewCustomer, NewProcessingLog, Order, OrderDetails, OrderStatus, OrderWithCustomer,
    ProcessingLog,
};
use sqlx::types::Json;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::report::{ReportLine, StatusCount, sort_counts};
use crate::store::OrderStore;
use crate::{Result, StoreError};

const ORDER_COLUMNS: &str = "o.id, o.customer_id, o.status, o.order_details, o.created_at, o.updated_at";

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_customer(row: &PgRow, prefix: &str) -> Result<Customer> {
        Ok(Customer {
            id: CustomerId::new(row.try_get(format!("{prefix}id").as_str())?),
            name: row.try_get(format!("{prefix}name").as_str())?,
            email: row.try_get(format!("{prefix}email").as_str())?,
            phone: row.try_get(format!("{prefix}phone").as_str())?,
            created_at: row.try_get(format!("{prefix}created_at").as_str())?,
            updated_at: row.try_get(format!("{prefix}updated_at").as_str())?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let Json(order_details): Json<OrderDetails> = row.try_get("order_details")?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            customer_id: CustomerId::new(row.try_get("customer_id")?),
            status: status.parse()?,
            order_details,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_log(row: &PgRow) -> Result<ProcessingLog> {
        let step: String = row.try_get("step")?;
        let status: String = row.try_get("status")?;

        Ok(ProcessingLog {
            id: row.try_get("id")?,
            order_id: OrderId::new(row.try_get("order_id")?),
            step: step.parse()?,
            status: status.parse()?,
            log_message: row.try_get("log_message")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, customer), fields(email = %customer.email))]
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (name, email, phone)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, phone, created_at, updated_at
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("customers_email_key")
            {
                return StoreError::DuplicateEmail(customer.email.clone());
            }
            StoreError::Database(e)
        })?;

        Self::row_to_customer(&row, "")
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, created_at, updated_at FROM customers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::row_to_customer(&r, "")).transpose()
    }

    #[tracing::instrument(skip(self, details))]
    async fn create_order(&self, customer_id: CustomerId, details: OrderDetails) -> Result<Order> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (customer_id, status, order_details)
            VALUES ($1, $2, $3)
            RETURNING id, customer_id, status, order_details, created_at, updated_at
            "#,
        )
        .bind(customer_id.as_i64())
        .bind(OrderStatus::Pending.as_str())
        .bind(Json(&details))
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_order(&row)
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1"))
            .bind(order_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_order(&r)).transpose()
    }

    async fn find_order_with_customer(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderWithCustomer>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS},
                   c.id AS c_id, c.name AS c_name, c.email AS c_email, c.phone AS c_phone,
                   c.created_at AS c_created_at, c.updated_at AS c_updated_at
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.id = $1
            "#
        ))
        .bind(order_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order = Self::row_to_order(&row)?;
        let customer_id: Option<i64> = row.try_get("c_id")?;
        let customer = match customer_id {
            Some(_) => Some(Self::row_to_customer(&row, "c_")?),
            None => None,
        };

        Ok(Some(OrderWithCustomer { order, customer }))
    }

    #[tracing::instrument(skip(self))]
    async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<bool> {
        let allowed: Vec<&str> = status.predecessors().iter().map(|s| s.as_str()).collect();

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            "#,
        )
        .bind(order_id.as_i64())
        .bind(status.as_str())
        .bind(allowed)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated > 0 {
            return Ok(true);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
            .bind(order_id.as_i64())
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Ok(false)
        } else {
            Err(StoreError::OrderNotFound(order_id))
        }
    }

    #[tracing::instrument(skip(self, entry), fields(order_id = %entry.order_id, step = %entry.step))]
    async fn append_processing_log(&self, entry: NewProcessingLog) -> Result<ProcessingLog> {
        let row = sqlx::query(
            r#"
            INSERT INTO order_processing_logs (order_id, step, status, log_message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, step, status, log_message, created_at
            "#,
        )
        .bind(entry.order_id.as_i64())
        .bind(entry.step.as_str())
        .bind(entry.status.as_str())
        .bind(&entry.log_message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return StoreError::OrderNotFound(entry.order_id);
            }
            StoreError::Database(e)
        })?;

        Self::row_to_log(&row)
    }

    async fn processing_logs(&self, order_id: OrderId) -> Result<Vec<ProcessingLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, step, status, log_message, created_at
            FROM order_processing_logs
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_log).collect()
    }

    async fn status_counts(&self) -> Result<Vec<StatusCount>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS total_orders FROM orders GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = rows
            .iter()
            .map(|row| -> Result<StatusCount> {
                let status: String = row.try_get("status")?;
                Ok(StatusCount {
                    status: status.parse()?,
                    total_orders: row.try_get("total_orders")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        sort_counts(&mut counts);
        Ok(counts)
    }

    async fn recent_transitions(&self, since: DateTime<Utc>) -> Result<Vec<ReportLine>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS},
                   l.id AS l_id, l.step AS l_step, l.status AS l_status,
                   l.log_message AS l_log_message, l.created_at AS l_created_at
            FROM order_processing_logs l
            JOIN orders o ON o.id = l.order_id
            WHERE o.created_at >= $1
            ORDER BY l.created_at DESC, o.id ASC, l.id ASC
            "#
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut lines = Vec::new();
        for row in &rows {
            let order = Self::row_to_order(row)?;
            let step: String = row.try_get("l_step")?;
            let status: String = row.try_get("l_status")?;
            let log = ProcessingLog {
                id: row.try_get("l_id")?,
                order_id: order.id,
                step: step.parse()?,
                status: status.parse()?,
                log_message: row.try_get("l_log_message")?,
                created_at: row.try_get("l_created_at")?,
            };
            lines.extend(ReportLine::expand(&order, &log));
        }
        Ok(lines)
    }
}
