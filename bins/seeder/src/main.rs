//! Database seeder for Stockplan development and testing.
//!
//! Seeds one demo season with categories, OTB plan rows for two stores and a
//! spread of purchase orders, then prints a manager token for the demo
//! company so the OTB routes can be exercised right away.
//!
//! Usage: cargo run --bin seeder

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use stockplan_db::entities::{
    categories, otb_plan, purchase_orders,
    sea_orm_active_enums::{PoSource, PoStatus, SeasonStatus},
    seasons,
};
use stockplan_shared::{AppConfig, JwtConfig, JwtService, Role};

/// Demo company (tenant) ID.
const DEMO_COMPANY_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);
/// Demo user ID.
const DEMO_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);
/// Demo season ID.
const DEMO_SEASON_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0010);

const STORES: [Uuid; 2] = [
    Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0101),
    Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0102),
];

/// (id, name, code, monthly spend limit per store)
const CATEGORIES: [(u128, &str, &str, i64); 4] = [
    (0x201, "Denim", "DNM", 12_000),
    (0x202, "Knitwear", "KNT", 8_000),
    (0x203, "Outerwear", "OUT", 15_000),
    (0x204, "Accessories", "ACC", 4_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = stockplan_db::connect(&config.database.url).await?;

    if seasons::Entity::find_by_id(DEMO_SEASON_ID)
        .one(&db)
        .await?
        .is_some()
    {
        println!("  Demo season already exists, skipping data...");
    } else {
        println!("Seeding season...");
        seed_season(&db).await?;

        println!("Seeding categories...");
        seed_categories(&db).await?;

        println!("Seeding OTB plan...");
        let rows = seed_plan(&db).await?;
        println!("  Created {rows} plan rows");

        println!("Seeding purchase orders...");
        let orders = seed_purchase_orders(&db).await?;
        println!("  Created {orders} purchase orders");
    }

    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: config.jwt.access_token_expires_minutes,
    });
    let token = jwt.generate_access_token(DEMO_USER_ID, DEMO_COMPANY_ID, Role::Manager)?;

    println!("Seeding complete!");
    println!("  Season:  {DEMO_SEASON_ID}");
    println!("  Token:   {token}");
    Ok(())
}

fn month(m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, 1).unwrap_or_default()
}

fn category_id(raw: u128) -> Uuid {
    Uuid::from_u128(raw)
}

async fn seed_season(db: &DatabaseConnection) -> anyhow::Result<()> {
    let now = Utc::now().into();
    seasons::ActiveModel {
        id: Set(DEMO_SEASON_ID),
        company_id: Set(Some(DEMO_COMPANY_ID)),
        season_code: Set("SS26".to_string()),
        name: Set("Spring Summer 2026".to_string()),
        start_date: Set(month(1)),
        end_date: Set(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap_or_default()),
        status: Set(SeasonStatus::OtbUploaded),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn seed_categories(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (raw, name, code, _) in CATEGORIES {
        if categories::Entity::find_by_id(category_id(raw))
            .one(db)
            .await?
            .is_some()
        {
            continue;
        }

        let now = Utc::now().into();
        categories::ActiveModel {
            id: Set(category_id(raw)),
            name: Set(name.to_string()),
            code: Set(Some(code.to_string())),
            description: Set(None),
            parent_id: Set(None),
            level: Set(0),
            path: Set(Some(code.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn seed_plan(db: &DatabaseConnection) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for (raw, _, _, limit) in CATEGORIES {
        for m in 1..=6 {
            for store in STORES {
                let now = Utc::now().into();
                let spend_limit = Decimal::from(limit);
                otb_plan::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    season_id: Set(DEMO_SEASON_ID),
                    location_id: Set(store),
                    category_id: Set(Some(category_id(raw))),
                    month: Set(month(m)),
                    planned_sales: Set(spend_limit * Decimal::TWO),
                    planned_closing_stock: Set(spend_limit),
                    opening_stock: Set(spend_limit),
                    on_order: Set(Decimal::ZERO),
                    approved_spend_limit: Set(spend_limit),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(db)
                .await?;
                inserted += 1;
            }
        }
    }
    Ok(inserted)
}

async fn seed_purchase_orders(db: &DatabaseConnection) -> anyhow::Result<usize> {
    // Denim runs hot, accessories barely move, one order is cancelled and
    // one draft has no order date yet.
    let orders: [(u128, Option<NaiveDate>, i64, PoStatus, &str); 8] = [
        (0x201, NaiveDate::from_ymd_opt(2026, 1, 8), 21_500, PoStatus::Complete, "Indigo Mills"),
        (0x201, NaiveDate::from_ymd_opt(2026, 2, 11), 23_000, PoStatus::Shipped, "Indigo Mills"),
        (0x202, NaiveDate::from_ymd_opt(2026, 1, 20), 9_400, PoStatus::Confirmed, "Northern Yarns"),
        (0x202, NaiveDate::from_ymd_opt(2026, 3, 2), 6_000, PoStatus::Cancelled, "Northern Yarns"),
        (0x203, NaiveDate::from_ymd_opt(2026, 2, 3), 18_250, PoStatus::Partial, "Alpine Outfitters"),
        (0x203, NaiveDate::from_ymd_opt(2026, 4, 15), 7_500, PoStatus::Submitted, "Alpine Outfitters"),
        (0x204, NaiveDate::from_ymd_opt(2026, 1, 28), 900, PoStatus::Confirmed, "Clasp & Co"),
        (0x204, None, 1_200, PoStatus::Draft, "Clasp & Co"),
    ];

    for (n, (raw, order_date, value, status, supplier)) in orders.into_iter().enumerate() {
        let now = Utc::now().into();
        purchase_orders::ActiveModel {
            id: Set(Uuid::new_v4()),
            season_id: Set(DEMO_SEASON_ID),
            location_id: Set(STORES[n % STORES.len()]),
            category_id: Set(Some(category_id(raw))),
            po_number: Set(format!("PO-SS26-{:04}", n + 1)),
            order_date: Set(order_date),
            po_value: Set(Decimal::from(value)),
            status: Set(status),
            source: Set(PoSource::Csv),
            supplier_name: Set(Some(supplier.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }
    Ok(orders.len())
}
