//! SQLite store tests against a unique temp-file database per test.

use collectibles_server::storage::{Database, OfferWrite, Store, StoreError};
use collectibles_types::{OrderItem, Product, ProductPatch, User, UserPatch};

async fn test_db(tag: &str) -> Database {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "collectibles-test-{}-{}-{}.db",
        tag,
        std::process::id(),
        nanos
    ));
    Database::new(&path.to_string_lossy()).await.unwrap()
}

fn user(id: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: email.to_string(),
    }
}

fn product(id: &str, name: &str, price: &str, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        descr: Some("SSJ Blue 15cm".to_string()),
        image_url: None,
        price: price.parse().unwrap(),
        stock,
        promo_price: None,
        valid_until: None,
    }
}

#[tokio::test]
async fn user_crud_round_trip() {
    let db = test_db("users").await;

    db.insert_user(&user("1", "rafael@example.com")).await.unwrap();
    assert!(db.user_exists("1").await.unwrap());

    let fetched = db.get_user("1").await.unwrap().unwrap();
    assert_eq!(fetched.email, "rafael@example.com");

    let patch = UserPatch {
        name: Some("Rafael Jr".to_string()),
        email: None,
    };
    let updated = db.patch_user("1", &patch).await.unwrap().unwrap();
    assert_eq!(updated.name, "Rafael Jr");
    assert_eq!(updated.email, "rafael@example.com");

    assert!(db.delete_user("1").await.unwrap());
    assert!(!db.delete_user("1").await.unwrap());
    assert!(db.get_user("1").await.unwrap().is_none());
}

#[tokio::test]
async fn unique_constraints_map_to_domain_errors() {
    let db = test_db("unique").await;

    db.insert_user(&user("1", "a@example.com")).await.unwrap();

    let dup_id = db.insert_user(&user("1", "b@example.com")).await;
    assert!(matches!(dup_id, Err(StoreError::DuplicateId)));

    let dup_email = db.insert_user(&user("2", "a@example.com")).await;
    assert!(matches!(dup_email, Err(StoreError::DuplicateEmail)));

    // Patching onto a taken email is also a conflict
    db.insert_user(&user("2", "b@example.com")).await.unwrap();
    let patch = UserPatch {
        name: None,
        email: Some("a@example.com".to_string()),
    };
    let result = db.patch_user("2", &patch).await;
    assert!(matches!(result, Err(StoreError::DuplicateEmail)));
}

#[tokio::test]
async fn list_users_is_sorted_by_id() {
    let db = test_db("list").await;

    db.insert_user(&user("3", "c@example.com")).await.unwrap();
    db.insert_user(&user("1", "a@example.com")).await.unwrap();
    db.insert_user(&user("2", "b@example.com")).await.unwrap();

    let ids: Vec<String> = db
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn product_patch_merges_only_present_fields() {
    let db = test_db("patch").await;

    db.insert_product(&product("p1", "Figura Goku", "499.00", 10))
        .await
        .unwrap();

    let patch = ProductPatch {
        stock: Some(7),
        ..Default::default()
    };
    let updated = db.patch_product("p1", &patch).await.unwrap().unwrap();
    assert_eq!(updated.stock, 7);
    assert_eq!(updated.name, "Figura Goku");
    assert_eq!(updated.price, "499.00".parse().unwrap());
    assert_eq!(updated.descr.as_deref(), Some("SSJ Blue 15cm"));

    assert!(db
        .patch_product("nope", &patch)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn offer_joins_into_product_reads_and_cascades_on_delete() {
    let db = test_db("offers").await;

    db.insert_product(&product("p1", "Figura Goku", "499.00", 10))
        .await
        .unwrap();

    let offer = OfferWrite {
        promo_price: "399.00".parse().unwrap(),
        valid_until: "2999-01-02".parse().unwrap(),
    };
    let with_offer = db.upsert_offer("p1", &offer).await.unwrap().unwrap();
    assert_eq!(with_offer.promo_price, Some("399.00".parse().unwrap()));

    // Replacing the offer keeps a single row per product
    let replaced = OfferWrite {
        promo_price: "379.50".parse().unwrap(),
        valid_until: "2999-01-05".parse().unwrap(),
    };
    let updated = db.upsert_offer("p1", &replaced).await.unwrap().unwrap();
    assert_eq!(updated.promo_price, Some("379.50".parse().unwrap()));
    assert_eq!(updated.valid_until, Some("2999-01-05".parse().unwrap()));

    // Offer row goes with the product
    assert!(db.delete_product("p1").await.unwrap());
    db.insert_product(&product("p1", "Figura Goku", "499.00", 10))
        .await
        .unwrap();
    let fresh = db.get_product("p1").await.unwrap().unwrap();
    assert!(fresh.promo_price.is_none());
    assert!(fresh.valid_until.is_none());

    assert!(db.upsert_offer("ghost", &offer).await.unwrap().is_none());
}

#[tokio::test]
async fn product_filter_matches_name_case_insensitively() {
    let db = test_db("filter").await;

    db.insert_product(&product("p1", "Figura Goku", "499.00", 10))
        .await
        .unwrap();
    db.insert_product(&product("p2", "Carta Pikachu", "1299.00", 5))
        .await
        .unwrap();

    let goku = db.list_products(Some("gOkU")).await.unwrap();
    assert_eq!(goku.len(), 1);
    assert_eq!(goku[0].id, "p1");

    let all = db.list_products(None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "p1");
    assert_eq!(all[1].id, "p2");
}

#[tokio::test]
async fn orders_persist_with_joined_item_names() {
    let db = test_db("orders").await;

    db.insert_user(&user("u1", "rafael@example.com")).await.unwrap();
    db.insert_product(&product("p1", "Figura Goku", "499.00", 10))
        .await
        .unwrap();

    let items = vec![OrderItem::new(
        "p1".to_string(),
        2,
        "499.00".parse().unwrap(),
    )];
    let order = db.create_order("u1", &items).await.unwrap();
    assert_eq!(order.total, "998.00".parse().unwrap());

    let fetched = db.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.user_id, "u1");
    assert_eq!(fetched.items.len(), 1);
    assert_eq!(
        fetched.items[0].product_name.as_deref(),
        Some("Figura Goku")
    );
    assert_eq!(fetched.items[0].subtotal, "998.00".parse().unwrap());

    assert!(db.get_order(order.id + 1000).await.unwrap().is_none());
}
