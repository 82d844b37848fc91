use crafters_market::{
    config,
    db::{create_pool, run_migrations},
};
use uuid::Uuid;

struct CategorySeed {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    icon: &'static str,
    display_order: i32,
}

const CATEGORIES: &[CategorySeed] = &[
    CategorySeed {
        name: "Jewelry",
        slug: "jewelry",
        description: "Handcrafted necklaces, bracelets, earrings, and rings",
        icon: "💍",
        display_order: 1,
    },
    CategorySeed {
        name: "Pottery",
        slug: "pottery",
        description: "Ceramic mugs, bowls, plates, and decorative items",
        icon: "🏺",
        display_order: 2,
    },
    CategorySeed {
        name: "Textiles",
        slug: "textiles",
        description: "Knitted scarves, blankets, bags, and clothing",
        icon: "🧶",
        display_order: 3,
    },
    CategorySeed {
        name: "Woodwork",
        slug: "woodwork",
        description: "Wooden bowls, furniture, toys, and decorative pieces",
        icon: "🪵",
        display_order: 4,
    },
    CategorySeed {
        name: "Art",
        slug: "art",
        description: "Paintings, prints, illustrations, and mixed media",
        icon: "🎨",
        display_order: 5,
    },
    CategorySeed {
        name: "Other",
        slug: "other",
        description: "Candles, soaps, and more unique items",
        icon: "✨",
        display_order: 6,
    },
    CategorySeed {
        name: "Leather Goods",
        slug: "leather-goods",
        description: "Leather bags, wallets, and accessories",
        icon: "✨",
        display_order: 7,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let pool = create_pool(&config::database_url()?).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    for category in CATEGORIES {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, icon, display_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                icon = EXCLUDED.icon,
                display_order = EXCLUDED.display_order,
                updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category.name)
        .bind(category.slug)
        .bind(category.description)
        .bind(category.icon)
        .bind(category.display_order)
        .execute(&pool)
        .await?;
        println!("Ensured category {} ({})", category.name, category.slug);
    }

    println!("Seed completed: {} categories", CATEGORIES.len());
    Ok(())
}
