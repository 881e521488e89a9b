use async_trait::async_trait;
use chrono::{DateTime, Utc};
use printfarm_catalog::article::generate_article;
use printfarm_catalog::{
    Category, CategoryDraft, Dimensions, Listing, Packaging, PackagingDraft, Printer,
    PrinterDraft, Product, ProductDetails, Settings, SettingsPatch,
};
use printfarm_core::repository::{
    CategoryRepository, PackagingRepository, PrinterRepository, ProductRepository,
    SettingsRepository, SnapshotRepository, StoreError, StoreResult,
};
use printfarm_core::CatalogSnapshot;
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

/// Fresh article codes tried before giving up on a create.
const ARTICLE_ATTEMPTS: usize = 5;

pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.message().to_string());
        }
        if db.is_foreign_key_violation() {
            return StoreError::Conflict(
                "referenced printer, packaging or category does not exist".to_string(),
            );
        }
    }
    StoreError::Backend(err.to_string())
}

fn decimal(column: &str, value: &str) -> StoreResult<Decimal> {
    Decimal::from_str(value)
        .map_err(|e| StoreError::Backend(format!("column {} holds {:?}: {}", column, value, e)))
}

#[derive(sqlx::FromRow)]
struct ModelRow {
    id: Uuid,
    article: String,
    name: String,
    description: String,
    specifications: String,
    source_link: String,
    category_id: Option<Uuid>,
    weight_grams: String,
    is_multicolor: bool,
    dimension_length: String,
    dimension_width: String,
    dimension_height: String,
    print_hours: String,
    printer_id: Option<Uuid>,
    plastic_price_per_kg: String,
    consumables_percent: String,
    defect_percent: String,
    packaging_id: Option<Uuid>,
    wb_commission_percent: String,
    wb_logistics_cost: String,
    wb_product_link: String,
    wb_generated_title: String,
    wb_generated_description: String,
    ozon_commission_percent: String,
    ozon_logistics_cost: String,
    ozon_product_link: String,
    ozon_generated_title: String,
    ozon_generated_description: String,
    desired_margin: String,
    is_archived: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ModelRow {
    fn into_product(self, images: Vec<String>) -> StoreResult<Product> {
        Ok(Product {
            id: self.id,
            article: self.article,
            details: ProductDetails {
                name: self.name,
                description: self.description,
                images,
                specifications: self.specifications,
                source_link: self.source_link,
                category_id: self.category_id,
                weight_grams: decimal("weight_grams", &self.weight_grams)?,
                is_multicolor: self.is_multicolor,
                dimensions: Dimensions {
                    length: decimal("dimension_length", &self.dimension_length)?,
                    width: decimal("dimension_width", &self.dimension_width)?,
                    height: decimal("dimension_height", &self.dimension_height)?,
                },
                print_hours: decimal("print_hours", &self.print_hours)?,
                printer_id: self.printer_id,
                plastic_price_per_kg: decimal("plastic_price_per_kg", &self.plastic_price_per_kg)?,
                consumables_percent: decimal("consumables_percent", &self.consumables_percent)?,
                defect_percent: decimal("defect_percent", &self.defect_percent)?,
                packaging_id: self.packaging_id,
                wb: Listing {
                    commission_percent: decimal("wb_commission_percent", &self.wb_commission_percent)?,
                    logistics_cost: decimal("wb_logistics_cost", &self.wb_logistics_cost)?,
                    product_link: self.wb_product_link,
                    generated_title: self.wb_generated_title,
                    generated_description: self.wb_generated_description,
                },
                ozon: Listing {
                    commission_percent: decimal(
                        "ozon_commission_percent",
                        &self.ozon_commission_percent,
                    )?,
                    logistics_cost: decimal("ozon_logistics_cost", &self.ozon_logistics_cost)?,
                    product_link: self.ozon_product_link,
                    generated_title: self.ozon_generated_title,
                    generated_description: self.ozon_generated_description,
                },
                desired_margin: decimal("desired_margin", &self.desired_margin)?,
            },
            is_archived: self.is_archived,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PrinterRow {
    id: Uuid,
    name: String,
    power_consumption_kw: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PrinterRow> for Printer {
    type Error = StoreError;

    fn try_from(row: PrinterRow) -> StoreResult<Self> {
        Ok(Printer {
            id: row.id,
            name: row.name,
            power_consumption_kw: decimal("power_consumption_kw", &row.power_consumption_kw)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PackagingRow {
    id: Uuid,
    name: String,
    length: String,
    width: String,
    height: String,
    weight: String,
    cost: String,
    link: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PackagingRow> for Packaging {
    type Error = StoreError;

    fn try_from(row: PackagingRow) -> StoreResult<Self> {
        Ok(Packaging {
            id: row.id,
            name: row.name,
            length: decimal("length", &row.length)?,
            width: decimal("width", &row.width)?,
            height: decimal("height", &row.height)?,
            weight: decimal("weight", &row.weight)?,
            cost: decimal("cost", &row.cost)?,
            link: row.link,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    color: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
            color: row.color,
            created_at: row.created_at,
        }
    }
}

const MODEL_COLUMNS: &str = "id, article, name, description, specifications, source_link, \
    category_id, weight_grams, is_multicolor, dimension_length, dimension_width, \
    dimension_height, print_hours, printer_id, plastic_price_per_kg, consumables_percent, \
    defect_percent, packaging_id, wb_commission_percent, wb_logistics_cost, wb_product_link, \
    wb_generated_title, wb_generated_description, ozon_commission_percent, ozon_logistics_cost, \
    ozon_product_link, ozon_generated_title, ozon_generated_description, desired_margin, \
    is_archived, created_at, updated_at";

async fn insert_model(conn: &mut SqliteConnection, product: &Product) -> Result<(), sqlx::Error> {
    let d = &product.details;
    sqlx::query(&format!(
        "INSERT INTO models ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, \
         ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        MODEL_COLUMNS
    ))
    .bind(product.id)
    .bind(&product.article)
    .bind(&d.name)
    .bind(&d.description)
    .bind(&d.specifications)
    .bind(&d.source_link)
    .bind(d.category_id)
    .bind(d.weight_grams.to_string())
    .bind(d.is_multicolor)
    .bind(d.dimensions.length.to_string())
    .bind(d.dimensions.width.to_string())
    .bind(d.dimensions.height.to_string())
    .bind(d.print_hours.to_string())
    .bind(d.printer_id)
    .bind(d.plastic_price_per_kg.to_string())
    .bind(d.consumables_percent.to_string())
    .bind(d.defect_percent.to_string())
    .bind(d.packaging_id)
    .bind(d.wb.commission_percent.to_string())
    .bind(d.wb.logistics_cost.to_string())
    .bind(&d.wb.product_link)
    .bind(&d.wb.generated_title)
    .bind(&d.wb.generated_description)
    .bind(d.ozon.commission_percent.to_string())
    .bind(d.ozon.logistics_cost.to_string())
    .bind(&d.ozon.product_link)
    .bind(&d.ozon.generated_title)
    .bind(&d.ozon.generated_description)
    .bind(d.desired_margin.to_string())
    .bind(product.is_archived)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    replace_images(conn, product.id, &d.images).await
}

async fn update_model(conn: &mut SqliteConnection, product: &Product) -> Result<(), sqlx::Error> {
    let d = &product.details;
    sqlx::query(
        "UPDATE models SET name = ?, description = ?, specifications = ?, source_link = ?, \
         category_id = ?, weight_grams = ?, is_multicolor = ?, dimension_length = ?, \
         dimension_width = ?, dimension_height = ?, print_hours = ?, printer_id = ?, \
         plastic_price_per_kg = ?, consumables_percent = ?, defect_percent = ?, packaging_id = ?, \
         wb_commission_percent = ?, wb_logistics_cost = ?, wb_product_link = ?, \
         wb_generated_title = ?, wb_generated_description = ?, ozon_commission_percent = ?, \
         ozon_logistics_cost = ?, ozon_product_link = ?, ozon_generated_title = ?, \
         ozon_generated_description = ?, desired_margin = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&d.name)
    .bind(&d.description)
    .bind(&d.specifications)
    .bind(&d.source_link)
    .bind(d.category_id)
    .bind(d.weight_grams.to_string())
    .bind(d.is_multicolor)
    .bind(d.dimensions.length.to_string())
    .bind(d.dimensions.width.to_string())
    .bind(d.dimensions.height.to_string())
    .bind(d.print_hours.to_string())
    .bind(d.printer_id)
    .bind(d.plastic_price_per_kg.to_string())
    .bind(d.consumables_percent.to_string())
    .bind(d.defect_percent.to_string())
    .bind(d.packaging_id)
    .bind(d.wb.commission_percent.to_string())
    .bind(d.wb.logistics_cost.to_string())
    .bind(&d.wb.product_link)
    .bind(&d.wb.generated_title)
    .bind(&d.wb.generated_description)
    .bind(d.ozon.commission_percent.to_string())
    .bind(d.ozon.logistics_cost.to_string())
    .bind(&d.ozon.product_link)
    .bind(&d.ozon.generated_title)
    .bind(&d.ozon.generated_description)
    .bind(d.desired_margin.to_string())
    .bind(product.updated_at)
    .bind(product.id)
    .execute(&mut *conn)
    .await?;

    replace_images(conn, product.id, &d.images).await
}

async fn replace_images(
    conn: &mut SqliteConnection,
    model_id: Uuid,
    images: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM model_images WHERE model_id = ?")
        .bind(model_id)
        .execute(&mut *conn)
        .await?;

    for (position, url) in images.iter().enumerate() {
        sqlx::query("INSERT INTO model_images (model_id, position, image_url) VALUES (?, ?, ?)")
            .bind(model_id)
            .bind(position as i64)
            .bind(url)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn fetch_model(conn: &mut SqliteConnection, id: Uuid) -> StoreResult<Option<Product>> {
    let row = sqlx::query_as::<_, ModelRow>(&format!(
        "SELECT {} FROM models WHERE id = ?",
        MODEL_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let images = sqlx::query_scalar::<_, String>(
        "SELECT image_url FROM model_images WHERE model_id = ? ORDER BY position",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;

    row.into_product(images).map(Some)
}

async fn insert_printer(conn: &mut SqliteConnection, printer: &Printer) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO printers (id, name, power_consumption_kw, created_at) VALUES (?, ?, ?, ?)")
        .bind(printer.id)
        .bind(&printer.name)
        .bind(printer.power_consumption_kw.to_string())
        .bind(printer.created_at)
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_packaging(
    conn: &mut SqliteConnection,
    packaging: &Packaging,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO packaging (id, name, length, width, height, weight, cost, link, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(packaging.id)
    .bind(&packaging.name)
    .bind(packaging.length.to_string())
    .bind(packaging.width.to_string())
    .bind(packaging.height.to_string())
    .bind(packaging.weight.to_string())
    .bind(packaging.cost.to_string())
    .bind(&packaging.link)
    .bind(packaging.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_category(conn: &mut SqliteConnection, category: &Category) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO categories (id, name, description, color, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.color)
        .bind(category.created_at)
        .execute(conn)
        .await?;
    Ok(())
}

async fn write_settings(conn: &mut SqliteConnection, settings: &Settings) -> StoreResult<()> {
    let data = serde_json::to_string(settings).map_err(|e| StoreError::Backend(e.to_string()))?;
    sqlx::query(
        "INSERT INTO settings (id, data, updated_at) VALUES (1, ?, ?) \
         ON CONFLICT (id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
    )
    .bind(data)
    .bind(Utc::now())
    .execute(conn)
    .await
    .map_err(db_error)?;
    Ok(())
}

async fn read_settings(conn: &mut SqliteConnection) -> StoreResult<Settings> {
    let data = sqlx::query_scalar::<_, String>("SELECT data FROM settings WHERE id = 1")
        .fetch_optional(conn)
        .await
        .map_err(db_error)?;

    match data {
        Some(data) => {
            serde_json::from_str(&data).map_err(|e| StoreError::Backend(format!("settings: {}", e)))
        }
        None => Ok(Settings::default()),
    }
}

impl SqliteCatalog {
    async fn conn(&self) -> StoreResult<sqlx::pool::PoolConnection<sqlx::Sqlite>> {
        self.pool.acquire().await.map_err(db_error)
    }

    /// Inserts `build(article)` under a fresh article code, retrying on collisions.
    async fn insert_with_fresh_article<F>(&self, build: F) -> StoreResult<Product>
    where
        F: Fn(String) -> Product + Send + Sync,
    {
        for attempt in 1..=ARTICLE_ATTEMPTS {
            let article = generate_article(&mut rand::thread_rng());
            let product = build(article);

            let mut tx = self.pool.begin().await.map_err(db_error)?;
            match insert_model(&mut tx, &product).await.map_err(db_error) {
                Ok(()) => {
                    tx.commit().await.map_err(db_error)?;
                    info!("Created model {} ({})", product.id, product.article);
                    return Ok(product);
                }
                Err(StoreError::Conflict(msg)) if msg.contains("article") => {
                    warn!("Article {} already taken (attempt {})", product.article, attempt);
                }
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::Conflict(
            "could not allocate a unique article code".to_string(),
        ))
    }
}

#[async_trait]
impl ProductRepository for SqliteCatalog {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ModelRow>(&format!(
            "SELECT {} FROM models ORDER BY created_at DESC",
            MODEL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let image_rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT model_id, image_url FROM model_images ORDER BY model_id, position",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut images: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (model_id, url) in image_rows {
            images.entry(model_id).or_default().push(url);
        }

        rows.into_iter()
            .map(|row| {
                let urls = images.remove(&row.id).unwrap_or_default();
                row.into_product(urls)
            })
            .collect()
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let mut conn = self.conn().await?;
        fetch_model(&mut conn, id).await
    }

    async fn create_product(&self, details: ProductDetails) -> StoreResult<Product> {
        self.insert_with_fresh_article(|article| Product::new(article, details.clone()))
            .await
    }

    async fn update_product(&self, id: Uuid, details: ProductDetails) -> StoreResult<Product> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut product = fetch_model(&mut tx, id)
            .await?
            .ok_or(StoreError::NotFound("model"))?;

        product.details = details;
        product.updated_at = Utc::now();
        update_model(&mut tx, &product).await.map_err(db_error)?;

        // Re-read so the caller sees exactly what was stored.
        let stored = fetch_model(&mut tx, id)
            .await?
            .ok_or(StoreError::NotFound("model"))?;
        tx.commit().await.map_err(db_error)?;
        Ok(stored)
    }

    async fn set_archived(&self, id: Uuid, archived: bool) -> StoreResult<Product> {
        let mut conn = self.conn().await?;
        let result = sqlx::query("UPDATE models SET is_archived = ?, updated_at = ? WHERE id = ?")
            .bind(archived)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("model"));
        }
        fetch_model(&mut conn, id)
            .await?
            .ok_or(StoreError::NotFound("model"))
    }

    async fn duplicate_product(&self, id: Uuid) -> StoreResult<Product> {
        let original = self
            .get_product(id)
            .await?
            .ok_or(StoreError::NotFound("model"))?;
        self.insert_with_fresh_article(|article| original.duplicate(article))
            .await
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM models WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("model"));
        }
        Ok(())
    }
}

#[async_trait]
impl PrinterRepository for SqliteCatalog {
    async fn list_printers(&self) -> StoreResult<Vec<Printer>> {
        sqlx::query_as::<_, PrinterRow>(
            "SELECT id, name, power_consumption_kw, created_at FROM printers ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(Printer::try_from)
        .collect()
    }

    async fn get_printer(&self, id: Uuid) -> StoreResult<Option<Printer>> {
        sqlx::query_as::<_, PrinterRow>(
            "SELECT id, name, power_consumption_kw, created_at FROM printers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Printer::try_from)
        .transpose()
    }

    async fn create_printer(&self, draft: PrinterDraft) -> StoreResult<Printer> {
        let printer = Printer::new(draft);
        let mut conn = self.conn().await?;
        insert_printer(&mut conn, &printer).await.map_err(db_error)?;
        Ok(printer)
    }

    async fn update_printer(&self, id: Uuid, draft: PrinterDraft) -> StoreResult<Printer> {
        let mut printer = self
            .get_printer(id)
            .await?
            .ok_or(StoreError::NotFound("printer"))?;
        printer.apply(draft);

        sqlx::query("UPDATE printers SET name = ?, power_consumption_kw = ? WHERE id = ?")
            .bind(&printer.name)
            .bind(printer.power_consumption_kw.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(printer)
    }

    async fn delete_printer(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM printers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("printer"));
        }
        Ok(())
    }
}

const PACKAGING_COLUMNS: &str = "id, name, length, width, height, weight, cost, link, created_at";

#[async_trait]
impl PackagingRepository for SqliteCatalog {
    async fn list_packaging(&self) -> StoreResult<Vec<Packaging>> {
        sqlx::query_as::<_, PackagingRow>(&format!(
            "SELECT {} FROM packaging ORDER BY created_at DESC",
            PACKAGING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(Packaging::try_from)
        .collect()
    }

    async fn get_packaging(&self, id: Uuid) -> StoreResult<Option<Packaging>> {
        sqlx::query_as::<_, PackagingRow>(&format!(
            "SELECT {} FROM packaging WHERE id = ?",
            PACKAGING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Packaging::try_from)
        .transpose()
    }

    async fn create_packaging(&self, draft: PackagingDraft) -> StoreResult<Packaging> {
        let packaging = Packaging::new(draft);
        let mut conn = self.conn().await?;
        insert_packaging(&mut conn, &packaging)
            .await
            .map_err(db_error)?;
        Ok(packaging)
    }

    async fn update_packaging(&self, id: Uuid, draft: PackagingDraft) -> StoreResult<Packaging> {
        let mut packaging = self
            .get_packaging(id)
            .await?
            .ok_or(StoreError::NotFound("packaging"))?;
        packaging.apply(draft);

        sqlx::query(
            "UPDATE packaging SET name = ?, length = ?, width = ?, height = ?, weight = ?, \
             cost = ?, link = ? WHERE id = ?",
        )
        .bind(&packaging.name)
        .bind(packaging.length.to_string())
        .bind(packaging.width.to_string())
        .bind(packaging.height.to_string())
        .bind(packaging.weight.to_string())
        .bind(packaging.cost.to_string())
        .bind(&packaging.link)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(packaging)
    }

    async fn delete_packaging(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM packaging WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("packaging"));
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for SqliteCatalog {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, color, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, color, created_at FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Category::from))
    }

    async fn create_category(&self, draft: CategoryDraft) -> StoreResult<Category> {
        let category = Category::new(draft);
        let mut conn = self.conn().await?;
        insert_category(&mut conn, &category)
            .await
            .map_err(db_error)?;
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, draft: CategoryDraft) -> StoreResult<Category> {
        let mut category = self
            .get_category(id)
            .await?
            .ok_or(StoreError::NotFound("category"))?;
        category.apply(draft);

        sqlx::query("UPDATE categories SET name = ?, description = ?, color = ? WHERE id = ?")
            .bind(&category.name)
            .bind(&category.description)
            .bind(&category.color)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(category)
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM models WHERE category_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;
        if count > 0 {
            return Err(StoreError::InUse {
                entity: "category",
                count,
            });
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("category"));
        }
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for SqliteCatalog {
    async fn get_settings(&self) -> StoreResult<Settings> {
        let mut conn = self.conn().await?;
        read_settings(&mut conn).await
    }

    async fn update_settings(&self, patch: SettingsPatch) -> StoreResult<Settings> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut settings = read_settings(&mut tx).await?;
        settings.apply(patch);
        settings.validate()?;
        write_settings(&mut tx, &settings).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(settings)
    }
}

fn validate_snapshot(snapshot: &CatalogSnapshot) -> StoreResult<()> {
    snapshot.settings.validate()?;
    for category in &snapshot.categories {
        CategoryDraft {
            name: category.name.clone(),
            ..CategoryDraft::default()
        }
        .validate()?;
    }
    for printer in &snapshot.printers {
        PrinterDraft {
            name: printer.name.clone(),
            power_consumption_kw: printer.power_consumption_kw,
        }
        .validate()?;
    }
    for packaging in &snapshot.packaging {
        PackagingDraft {
            name: packaging.name.clone(),
            length: packaging.length,
            width: packaging.width,
            height: packaging.height,
            weight: packaging.weight,
            cost: packaging.cost,
            link: packaging.link.clone(),
        }
        .validate()?;
    }
    for model in &snapshot.models {
        model.details.validate()?;
    }
    Ok(())
}

#[async_trait]
impl SnapshotRepository for SqliteCatalog {
    async fn export_snapshot(&self) -> StoreResult<CatalogSnapshot> {
        Ok(CatalogSnapshot::new(
            self.get_settings().await?,
            self.list_categories().await?,
            self.list_printers().await?,
            self.list_packaging().await?,
            self.list_products().await?,
        ))
    }

    async fn import_snapshot(&self, snapshot: CatalogSnapshot) -> StoreResult<()> {
        validate_snapshot(&snapshot)?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        for table in ["model_images", "models", "categories", "printers", "packaging"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        write_settings(&mut tx, &snapshot.settings).await?;
        for category in &snapshot.categories {
            insert_category(&mut tx, category).await.map_err(db_error)?;
        }
        for printer in &snapshot.printers {
            insert_printer(&mut tx, printer).await.map_err(db_error)?;
        }
        for packaging in &snapshot.packaging {
            insert_packaging(&mut tx, packaging).await.map_err(db_error)?;
        }
        for model in &snapshot.models {
            insert_model(&mut tx, model).await.map_err(db_error)?;
        }
        tx.commit().await.map_err(db_error)?;

        info!(
            "Imported snapshot: {} models, {} printers, {} packaging, {} categories",
            snapshot.models.len(),
            snapshot.printers.len(),
            snapshot.packaging.len(),
            snapshot.categories.len()
        );
        Ok(())
    }
}
