//! # Seed Data Generator
//!
//! Populates a database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./shopfront_dev.db with 200 products (default)
//! cargo run -p shopfront-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p shopfront-db --bin seed -- --count 1000 --db ./data/shopfront.db
//! ```
//!
//! ## Generated Data
//! - One category per entry in [`CATALOG`]
//! - Products named `{item} {size}` with generated SKUs
//! - A handful of suppliers and customers
//! - One received purchase order and a few invoices, so reports have rows

use anyhow::Context;
use shopfront_core::{
    Money, NewCartItem, NewPurchaseOrderLine, PartyDetails, PaymentMethod, StockDeduction,
};
use shopfront_db::{Database, DbConfig, NewInvoice, NewProduct, NewPurchaseOrder};
use std::env;

/// Category name and the items sold in it.
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Coffee",
        &[
            "Espresso Beans",
            "House Blend",
            "Decaf Colombia",
            "Ethiopia Yirgacheffe",
            "Cold Brew Concentrate",
            "Instant Gold",
        ],
    ),
    (
        "Tea",
        &[
            "English Breakfast",
            "Earl Grey",
            "Sencha",
            "Chamomile",
            "Rooibos",
            "Masala Chai",
        ],
    ),
    (
        "Bakery",
        &[
            "Butter Croissant",
            "Sourdough Loaf",
            "Cinnamon Roll",
            "Banana Bread",
            "Oat Cookie",
        ],
    ),
    (
        "Equipment",
        &[
            "Pour Over Cone",
            "French Press",
            "Milk Jug",
            "Paper Filters",
            "Burr Grinder",
        ],
    ),
];

/// Size label and price add-on in cents.
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Regular", 150), ("Large", 300), ("Bulk", 900)];

const SUPPLIERS: &[&str] = &["Hill Roastery", "Leaf & Co", "Northside Bakery", "Brewgear Ltd"];

const CUSTOMERS: &[&str] = &["Corner Cafe", "City Library", "Greenway Office"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./shopfront_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if let Some(value) = args.get(i + 1) {
                    count = value.parse().context("--count expects a number")?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopfront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./shopfront_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Shopfront Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {}", db_path))?;

    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Catalog
    let mut skus = Vec::new();
    'catalog: for (category_idx, (category, items)) in CATALOG.iter().enumerate() {
        let category = db.categories().create(category, None).await?;

        for (item_idx, item) in items.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if skus.len() >= count {
                    break 'catalog;
                }
                let seed = category_idx * 100 + item_idx * 10 + size_idx;
                let product = demo_product(category.id, item, size, *addon, seed);
                match db.products().create(&product).await {
                    Ok(created) => skus.push((created.sku, created.name, created.price_cents, created.cost_cents)),
                    Err(e) => eprintln!("Failed to insert {} {}: {}", item, size, e),
                }
            }
        }
    }
    println!("✓ Generated {} products", skus.len());

    // Parties
    let mut supplier_codes = Vec::new();
    for name in SUPPLIERS {
        let supplier = db
            .suppliers()
            .create(&PartyDetails {
                name: name.to_string(),
                contact_person: Some("Orders Desk".to_string()),
                ..Default::default()
            })
            .await?;
        supplier_codes.push(supplier.supplier_code);
    }
    let mut customer_codes = Vec::new();
    for name in CUSTOMERS {
        let customer = db
            .customers()
            .create(&PartyDetails {
                name: name.to_string(),
                ..Default::default()
            })
            .await?;
        customer_codes.push(customer.customer_code);
    }
    println!(
        "✓ Created {} suppliers, {} customers",
        supplier_codes.len(),
        customer_codes.len()
    );

    // One received purchase order restocking the first few products
    if let Some(supplier_code) = supplier_codes.first() {
        let lines: Vec<NewPurchaseOrderLine> = skus
            .iter()
            .take(5)
            .map(|(sku, name, _, cost)| NewPurchaseOrderLine {
                sku: sku.clone(),
                product_name: name.clone(),
                quantity: 24,
                unit_cost_cents: *cost,
            })
            .collect();
        if !lines.is_empty() {
            let total: Money = lines.iter().map(NewPurchaseOrderLine::line_total).sum();
            let order = db
                .purchase_orders()
                .create(&NewPurchaseOrder {
                    supplier_code: supplier_code.clone(),
                    lines,
                    total_cost_cents: total.cents(),
                })
                .await?;
            db.purchase_orders().receive(&order.order_code).await?;
            println!("✓ Received purchase order {}", order.order_code);
        }
    }

    // A few invoices, each deducting stock the way the till does
    for (n, chunk) in skus.chunks(3).take(4).enumerate() {
        let items: Vec<NewCartItem> = chunk
            .iter()
            .map(|(sku, name, price, _)| NewCartItem {
                sku: sku.clone(),
                name: name.clone(),
                quantity: 1,
                price_cents: *price,
                discount_cents: None,
            })
            .collect();
        let deductions: Vec<StockDeduction> = items
            .iter()
            .map(|item| StockDeduction {
                sku: item.sku.clone(),
                quantity: item.quantity,
            })
            .collect();
        if db.products().deduct_stock(&deductions).await.is_err() {
            continue;
        }

        let total: Money = items.iter().map(NewCartItem::line_total).sum();
        let code = db
            .invoices()
            .save(&NewInvoice {
                customer_code: customer_codes.get(n).cloned(),
                post_date: None,
                due_date: None,
                payment_method: PaymentMethod::Cash,
                total_cents: total.cents(),
                discount_cents: 0,
                net_cents: total.cents(),
                items,
            })
            .await?;
        println!("✓ Saved invoice {} ({})", code, total);
    }

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());
    Ok(())
}

/// Builds one demo product with deterministic prices and stock.
fn demo_product(category_id: i64, item: &str, size: &str, addon: i64, seed: usize) -> NewProduct {
    // $2.50 - $12.49 base + size add-on
    let price_cents = 250 + ((seed * 37) % 1000) as i64 + addon;
    // cost at 55-74% of price
    let cost_cents = price_cents * (55 + (seed % 20) as i64) / 100;

    NewProduct {
        sku: None,
        name: format!("{} {}", item, size),
        category_id: Some(category_id),
        quantity: (seed % 41) as i64,
        cost_cents,
        price_cents,
        max_discount: [0, 5, 10, 15][seed % 4],
    }
}
