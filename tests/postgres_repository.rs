//! Runs the PostgreSQL repository against a live server.
//! `DATABASE_URL=postgres://... cargo test --test postgres_repository -- --ignored`

use myapp::sort::Sort;
use myapp::{ensure_database_exists, ensure_entity_tables, AppError, PgRepository, Repository, A, B};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

struct Fixture {
    pool: PgPool,
    schema: String,
    repo: PgRepository,
}

impl Fixture {
    /// Fresh schema per test so runs do not see each other's rows.
    async fn new() -> Fixture {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
        ensure_database_exists(&url).await.unwrap();
        let pool = PgPoolOptions::new().max_connections(2).connect(&url).await.unwrap();
        let schema = format!("test_{}", uuid::Uuid::new_v4().simple());
        ensure_entity_tables(&pool, &schema).await.unwrap();
        let repo = PgRepository::new(pool.clone(), schema.clone());
        Fixture { pool, schema, repo }
    }

    async fn drop_schema(self) {
        sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", self.schema))
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn save_find_and_delete_round_trip() {
    let fx = Fixture::new().await;
    let repo = &fx.repo;

    let first = repo.save(A::default()).await.unwrap();
    let second = repo.save(A::default()).await.unwrap();
    let first_id = first.id.expect("generated id");
    let second_id = second.id.expect("generated id");
    assert!(second_id > first_id);

    assert_eq!(repo.find_by_id::<A>(first_id).await.unwrap(), Some(first.clone()));
    assert!(repo.exists_by_id::<A>(second_id).await.unwrap());
    assert_eq!(repo.find_by_id::<B>(first_id).await.unwrap(), None);

    let desc: Vec<A> = repo.find_all(&Sort::parse("id,desc").unwrap()).await.unwrap();
    assert_eq!(desc, vec![second.clone(), first.clone()]);

    let rewritten = repo.save(first.clone()).await.unwrap();
    assert_eq!(rewritten, first);
    assert_eq!(repo.find_all::<A>(&[]).await.unwrap().len(), 2);

    repo.delete_by_id::<A>(first_id).await.unwrap();
    repo.delete_by_id::<A>(first_id).await.unwrap();
    assert_eq!(repo.find_by_id::<A>(first_id).await.unwrap(), None);
    assert!(!repo.exists_by_id::<A>(first_id).await.unwrap());

    let unknown = repo.find_all::<A>(&Sort::parse("name").unwrap()).await;
    assert!(matches!(unknown, Err(AppError::BadRequest(_))));

    repo.ping().await.unwrap();
    fx.drop_schema().await;
}
