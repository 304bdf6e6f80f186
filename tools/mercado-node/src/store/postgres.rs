use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::{GenericClient, NoTls, Row};
use tracing::info;

use mercado_common::category::{Category, CategoryId};
use mercado_common::error::MarketError;
use mercado_common::listing::{ensure_capacity, Listing};
use mercado_common::phone::Phone;
use mercado_common::producer::{NewProducer, Producer, ProducerId};
use mercado_common::product::{Product, ProductDetails, ProductId, ProductStatus};
use mercado_common::subscription;

use super::{OwnedProduct, Store, StoreError};

const SCHEMA: &str = include_str!("schema.sql");

const PRODUCER_COLUMNS: &str =
    "id, name, farm, phone, is_premium, subscription_started_at, paid_months";

const PRODUCT_COLUMNS: &str =
    "id, name, quantity, unit, price, description, status, producer_id, category_id, created_at";

const LISTING_QUERY: &str = "\
    SELECT p.id, p.name, p.quantity, p.unit, p.price, p.description, p.status, \
           p.producer_id, p.category_id, p.created_at, \
           pr.name AS producer_name, pr.farm, pr.phone, pr.is_premium, \
           c.name AS category_name \
    FROM products p \
    JOIN producers pr ON pr.id = p.producer_id \
    JOIN categories c ON c.id = p.category_id \
    WHERE p.status = 'available' AND ($1::BIGINT IS NULL OR p.category_id = $1) \
    ORDER BY pr.is_premium DESC, p.created_at DESC, p.id DESC";

/// PostgreSQL backend over a deadpool connection pool.
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Build the pool. No connection is opened until the first query.
    pub fn connect(database_url: &str, pool_size: usize) -> Result<Self, StoreError> {
        let pg_config: tokio_postgres::Config = database_url.parse()?;
        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager).max_size(pool_size).build()?;
        Ok(Self { pool })
    }
}

// ─── Row decoding ───────────────────────────────────────────────────────────

fn decode_phone(raw: &str) -> Result<Phone, StoreError> {
    Phone::parse(raw).map_err(|_| StoreError::Decode(format!("stored phone '{raw}' is invalid")))
}

fn producer_from_row(row: &Row) -> Result<Producer, StoreError> {
    let phone: String = row.try_get("phone")?;
    let paid_months: i32 = row.try_get("paid_months")?;
    Ok(Producer {
        id: ProducerId(row.try_get("id")?),
        name: row.try_get("name")?,
        farm: row.try_get("farm")?,
        phone: decode_phone(&phone)?,
        premium: row.try_get("is_premium")?,
        subscription_started_at: row.try_get("subscription_started_at")?,
        paid_months: u32::try_from(paid_months)
            .map_err(|_| StoreError::Decode(format!("negative paid_months {paid_months}")))?,
    })
}

fn product_from_row(row: &Row) -> Result<Product, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(Product {
        id: ProductId(row.try_get("id")?),
        name: row.try_get("name")?,
        quantity: row.try_get("quantity")?,
        unit: row.try_get("unit")?,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
        status: status.parse::<ProductStatus>().map_err(StoreError::Decode)?,
        producer_id: ProducerId(row.try_get("producer_id")?),
        category_id: CategoryId(row.try_get("category_id")?),
        created_at: row.try_get("created_at")?,
    })
}

fn listing_from_row(row: &Row) -> Result<Listing, StoreError> {
    let product = product_from_row(row)?;
    let phone: String = row.try_get("phone")?;
    Ok(Listing {
        category: Category {
            id: product.category_id,
            name: row.try_get("category_name")?,
        },
        producer_name: row.try_get("producer_name")?,
        farm: row.try_get("farm")?,
        phone: decode_phone(&phone)?,
        premium: row.try_get("is_premium")?,
        product,
    })
}

// ─── Shared queries ─────────────────────────────────────────────────────────

async fn find_producer<C>(client: &C, phone: &Phone) -> Result<Option<Producer>, StoreError>
where
    C: GenericClient + Sync,
{
    let sql = format!("SELECT {PRODUCER_COLUMNS} FROM producers WHERE phone = $1 ORDER BY id LIMIT 1");
    client
        .query_opt(sql.as_str(), &[&phone.as_str()])
        .await?
        .map(|row| producer_from_row(&row))
        .transpose()
}

async fn ensure_category<C>(client: &C, id: CategoryId) -> Result<(), StoreError>
where
    C: GenericClient + Sync,
{
    match client
        .query_opt("SELECT 1 FROM categories WHERE id = $1", &[&id.0])
        .await?
    {
        Some(_) => Ok(()),
        None => Err(MarketError::UnknownCategory(id.0).into()),
    }
}

/// Lock the product row and check `phone` against its owner.
async fn owned_for_update<C>(client: &C, id: ProductId, phone: &Phone) -> Result<Product, StoreError>
where
    C: GenericClient + Sync,
{
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
    let row = client
        .query_opt(sql.as_str(), &[&id.0])
        .await?
        .ok_or(MarketError::ProductNotFound(id))?;
    let product = product_from_row(&row)?;

    let sql = format!("SELECT {PRODUCER_COLUMNS} FROM producers WHERE id = $1");
    let owner_row = client
        .query_opt(sql.as_str(), &[&product.producer_id.0])
        .await?
        .ok_or(MarketError::ProductNotFound(id))?;
    producer_from_row(&owner_row)?.authorize(phone)?;
    Ok(product)
}

async fn set_status<C>(client: &C, id: ProductId, status: ProductStatus) -> Result<u64, StoreError>
where
    C: GenericClient + Sync,
{
    Ok(client
        .execute(
            "UPDATE products SET status = $2 WHERE id = $1",
            &[&id.0, &status.as_str()],
        )
        .await?)
}

async fn insert_producer<C>(client: &C, producer: &NewProducer) -> Result<Producer, StoreError>
where
    C: GenericClient + Sync,
{
    let sql = format!(
        "INSERT INTO producers (name, farm, phone) VALUES ($1, $2, $3) RETURNING {PRODUCER_COLUMNS}"
    );
    let row = client
        .query_one(
            sql.as_str(),
            &[&producer.name, &producer.farm, &producer.phone.as_str()],
        )
        .await?;
    producer_from_row(&row)
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        info!("Database schema ready");
        Ok(())
    }

    async fn seed_categories(&self, names: &[&str]) -> Result<usize, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        let mut added = 0;
        for name in names {
            added += tx
                .execute(
                    "INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
                    &[name],
                )
                .await?;
        }
        tx.commit().await?;
        Ok(added as usize)
    }

    async fn seed_producer(&self, producer: NewProducer) -> Result<bool, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        let any: bool = tx
            .query_one("SELECT EXISTS (SELECT 1 FROM producers)", &[])
            .await?
            .try_get(0)?;
        if any {
            return Ok(false);
        }
        insert_producer(&*tx, &producer).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let client = self.pool.get().await?;
        client
            .query("SELECT id, name FROM categories ORDER BY id", &[])
            .await?
            .iter()
            .map(|row| -> Result<Category, StoreError> {
                Ok(Category {
                    id: CategoryId(row.try_get("id")?),
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn list_available(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Listing>, StoreError> {
        let client = self.pool.get().await?;
        let category = category.map(|c| c.0);
        client
            .query(LISTING_QUERY, &[&category])
            .await?
            .iter()
            .map(listing_from_row)
            .collect()
    }

    async fn producer_by_phone(&self, phone: &Phone) -> Result<Option<Producer>, StoreError> {
        let client = self.pool.get().await?;
        find_producer(&**client, phone).await
    }

    async fn products_by_phone(
        &self,
        phone: &Phone,
    ) -> Result<(Producer, Vec<Product>), StoreError> {
        let client = self.pool.get().await?;
        let producer = find_producer(&**client, phone)
            .await?
            .ok_or(MarketError::ProducerNotFound)?;
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE producer_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let products = client
            .query(sql.as_str(), &[&producer.id.0])
            .await?
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((producer, products))
    }

    async fn product(&self, id: ProductId) -> Result<Option<OwnedProduct>, StoreError> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let Some(row) = client.query_opt(sql.as_str(), &[&id.0]).await? else {
            return Ok(None);
        };
        let product = product_from_row(&row)?;

        let sql = format!("SELECT {PRODUCER_COLUMNS} FROM producers WHERE id = $1");
        let owner = client
            .query_opt(sql.as_str(), &[&product.producer_id.0])
            .await?
            .map(|row| producer_from_row(&row))
            .transpose()?;
        Ok(owner.map(|owner| OwnedProduct { product, owner }))
    }

    async fn submit_product(
        &self,
        producer: NewProducer,
        details: ProductDetails,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError> {
        let mut client = self.pool.get().await?;
        // Dropping `tx` without commit rolls everything back, a freshly
        // inserted producer included.
        let tx = client.transaction().await?;

        ensure_category(&*tx, details.category_id).await?;

        let owner = match find_producer(&*tx, &producer.phone).await? {
            Some(owner) => {
                let active: i64 = tx
                    .query_one(
                        "SELECT COUNT(*) FROM products WHERE producer_id = $1 AND status = 'available'",
                        &[&owner.id.0],
                    )
                    .await?
                    .try_get(0)?;
                ensure_capacity(&owner, active.max(0) as u64)?;
                owner
            }
            None => {
                let owner = insert_producer(&*tx, &producer).await?;
                info!(producer = %owner.id, "Registered new producer");
                owner
            }
        };

        let sql = format!(
            "INSERT INTO products \
             (name, quantity, unit, price, description, status, producer_id, category_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {PRODUCT_COLUMNS}"
        );
        let row = tx
            .query_one(
                sql.as_str(),
                &[
                    &details.name,
                    &details.quantity,
                    &details.unit,
                    &details.price,
                    &details.description,
                    &ProductStatus::Available.as_str(),
                    &owner.id.0,
                    &details.category_id.0,
                    &now,
                ],
            )
            .await?;
        let product = product_from_row(&row)?;
        tx.commit().await?;
        Ok(product)
    }

    async fn mark_sold(&self, id: ProductId) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        let updated = set_status(&**client, id, ProductStatus::Sold).await?;
        Ok(updated > 0)
    }

    async fn update_product(
        &self,
        id: ProductId,
        phone: &Phone,
        details: ProductDetails,
    ) -> Result<Product, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        owned_for_update(&*tx, id, phone).await?;
        ensure_category(&*tx, details.category_id).await?;

        let sql = format!(
            "UPDATE products SET name = $2, quantity = $3, unit = $4, price = $5, \
             description = $6, category_id = $7 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = tx
            .query_one(
                sql.as_str(),
                &[
                    &id.0,
                    &details.name,
                    &details.quantity,
                    &details.unit,
                    &details.price,
                    &details.description,
                    &details.category_id.0,
                ],
            )
            .await?;
        let product = product_from_row(&row)?;
        tx.commit().await?;
        Ok(product)
    }

    async fn withdraw_product(&self, id: ProductId, phone: &Phone) -> Result<Product, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let mut product = owned_for_update(&*tx, id, phone).await?;
        set_status(&*tx, id, ProductStatus::Sold).await?;
        tx.commit().await?;

        product.status = ProductStatus::Sold;
        Ok(product)
    }

    async fn activate_premium(
        &self,
        phone: &Phone,
        months: u32,
        now: DateTime<Utc>,
    ) -> Result<Producer, StoreError> {
        let months = subscription::validate_months(months)?;
        let months_column = i32::try_from(months).map_err(|_| MarketError::InvalidMonths)?;

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        let mut producer = find_producer(&*tx, phone)
            .await?
            .ok_or(MarketError::ProducerNotFound)?;

        producer.activate_premium(months, now);
        tx.execute(
            "UPDATE producers SET is_premium = TRUE, subscription_started_at = $2, paid_months = $3 \
             WHERE id = $1",
            &[&producer.id.0, &now, &months_column],
        )
        .await?;
        tx.commit().await?;
        Ok(producer)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<Producer>, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let sql = format!("SELECT {PRODUCER_COLUMNS} FROM producers WHERE is_premium FOR UPDATE");
        let mut premium = tx
            .query(sql.as_str(), &[])
            .await?
            .iter()
            .map(producer_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<i64> = subscription::sweep(premium.iter_mut(), now)
            .into_iter()
            .map(|id| id.0)
            .collect();
        if !ids.is_empty() {
            tx.execute(
                "UPDATE producers SET is_premium = FALSE WHERE id = ANY($1)",
                &[&ids],
            )
            .await?;
        }
        tx.commit().await?;

        Ok(premium.into_iter().filter(|p| ids.contains(&p.id.0)).collect())
    }
}
