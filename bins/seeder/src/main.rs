//! Database seeder for Payflow development and testing.
//!
//! Seeds the status dictionaries, a demo invoice type, and a two-stage
//! approval route for local development.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use payflow_db::entities::{
    approval_routes, invoice_statuses, invoice_types, payment_statuses, workflow_stages,
};
use payflow_shared::AppConfig;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Demo invoice type code (consistent for all seeds)
const DEMO_INVOICE_TYPE: &str = "services";
/// Demo route name (consistent for all seeds)
const DEMO_ROUTE_NAME: &str = "Standard 2-stage";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().expect("Failed to load configuration");

    println!("Connecting to database...");
    let db = payflow_db::connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding payment statuses...");
    seed_payment_statuses(&db).await;

    println!("Seeding invoice statuses...");
    seed_invoice_statuses(&db).await;

    println!("Seeding demo invoice type...");
    let invoice_type_id = seed_invoice_type(&db).await;

    println!("Seeding demo approval route...");
    seed_demo_route(&db, invoice_type_id).await;

    println!("Seeding complete!");
}

/// Seeds the payment status dictionary.
async fn seed_payment_statuses(db: &DatabaseConnection) {
    let statuses = [
        ("created", "Created"),
        ("under_review", "Under review"),
        ("approved_for_payment", "Approved for payment"),
        ("paid", "Paid"),
        ("cancelled", "Cancelled"),
    ];

    for (code, name) in statuses {
        let exists = payment_statuses::Entity::find()
            .filter(payment_statuses::Column::Code.eq(code))
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some();
        if exists {
            println!("  Payment status '{code}' already exists, skipping...");
            continue;
        }

        let status = payment_statuses::ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        if let Err(e) = status.insert(db).await {
            eprintln!("Failed to insert payment status '{code}': {e}");
        } else {
            println!("  Created payment status: {code}");
        }
    }
}

/// Seeds the invoice status dictionary.
async fn seed_invoice_statuses(db: &DatabaseConnection) {
    let statuses = [
        ("created", "Created"),
        ("under_review", "Under review"),
        ("approved_for_payment", "Approved for payment"),
        ("partially_paid", "Partially paid"),
        ("paid", "Paid"),
        ("cancelled", "Cancelled"),
    ];

    for (code, name) in statuses {
        let exists = invoice_statuses::Entity::find()
            .filter(invoice_statuses::Column::Code.eq(code))
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some();
        if exists {
            println!("  Invoice status '{code}' already exists, skipping...");
            continue;
        }

        let status = invoice_statuses::ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        if let Err(e) = status.insert(db).await {
            eprintln!("Failed to insert invoice status '{code}': {e}");
        } else {
            println!("  Created invoice status: {code}");
        }
    }
}

/// Seeds the demo invoice type and returns its id.
async fn seed_invoice_type(db: &DatabaseConnection) -> i32 {
    if let Ok(Some(existing)) = invoice_types::Entity::find()
        .filter(invoice_types::Column::Code.eq(DEMO_INVOICE_TYPE))
        .one(db)
        .await
    {
        println!("  Invoice type '{DEMO_INVOICE_TYPE}' already exists, skipping...");
        return existing.id;
    }

    let invoice_type = invoice_types::ActiveModel {
        code: Set(DEMO_INVOICE_TYPE.to_string()),
        name: Set("Services".to_string()),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    let inserted = invoice_type
        .insert(db)
        .await
        .expect("Failed to insert demo invoice type");
    println!("  Created invoice type: {DEMO_INVOICE_TYPE}");
    inserted.id
}

/// Seeds a two-stage route: buyer review, then finance review.
async fn seed_demo_route(db: &DatabaseConnection, invoice_type_id: i32) {
    let exists = approval_routes::Entity::find()
        .filter(approval_routes::Column::Name.eq(DEMO_ROUTE_NAME))
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some();
    if exists {
        println!("  Route '{DEMO_ROUTE_NAME}' already exists, skipping...");
        return;
    }

    let now = Utc::now().into();
    let route = approval_routes::ActiveModel {
        invoice_type_id: Set(invoice_type_id),
        name: Set(DEMO_ROUTE_NAME.to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let route = route.insert(db).await.expect("Failed to insert demo route");

    let stages = [
        (
            0,
            1,
            "Buyer review",
            Some(serde_json::json!({ "can_edit_amount": true, "can_add_files": true })),
        ),
        (1, 2, "Finance review", None),
    ];

    for (order_index, role_id, name, permissions) in stages {
        let stage = workflow_stages::ActiveModel {
            route_id: Set(route.id),
            order_index: Set(order_index),
            role_id: Set(role_id),
            name: Set(Some(name.to_string())),
            resulting_payment_status: Set(None),
            resulting_invoice_status: Set(None),
            permissions: Set(permissions),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Err(e) = stage.insert(db).await {
            eprintln!("Failed to insert stage '{name}': {e}");
        } else {
            println!("  Created stage {order_index}: {name}");
        }
    }
}
