use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_storefront_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

// One-time bootstrap: the ADMIN_EMAIL/ADMIN_PASSWORD pair seeds a database
// admin row here instead of acting as a standing login fallback.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let admin_password =
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "changeme123".to_string());

    let admin_id = ensure_user(&pool, "Store Admin", &admin_email, &admin_password, "admin").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If the user already exists, fetch its id.
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "Classic Cotton Tee",
            "Lightweight round-neck t-shirt",
            399,
            "Men",
            "Topwear",
            vec!["/uploads/classic-tee-front.jpg", "/uploads/classic-tee-back.jpg"],
            vec!["S", "M", "L", "XL"],
            true,
        ),
        (
            "Relaxed Fit Jeans",
            "Mid-rise jeans in washed denim",
            1299,
            "Women",
            "Bottomwear",
            vec!["/uploads/relaxed-jeans.jpg"],
            vec!["M", "L", "XL"],
            false,
        ),
        (
            "Kids Hooded Jacket",
            "Zip-up fleece hoodie",
            899,
            "Kids",
            "Winterwear",
            vec!["/uploads/kids-hoodie.jpg"],
            vec!["S", "M"],
            false,
        ),
    ];

    for (name, desc, price, category, sub_category, images, sizes, bestseller) in products {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, category, sub_category, images, sizes, bestseller)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price as i64)
        .bind(category)
        .bind(sub_category)
        .bind(serde_json::json!(images))
        .bind(serde_json::json!(sizes))
        .bind(bestseller)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
