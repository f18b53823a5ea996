use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use flowtrail_application::log_ports::{ChangeLogRepository, ChangeRecord, LogFilter};
use flowtrail_core::{AppError, TenantId};
use flowtrail_domain::{BusinessModule, OperationStatus, OperationType};

use super::PostgresChangeLogRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres change log tests: {error}");
    }

    Some(pool)
}

fn tenant() -> TenantId {
    TenantId::new(format!("test-{}", Uuid::new_v4())).unwrap_or_else(|_| unreachable!())
}

fn record(tenant_id: &TenantId, minutes_ago: i64) -> ChangeRecord {
    ChangeRecord {
        id: Uuid::new_v4(),
        operation_type: OperationType::Update,
        business_module: BusinessModule::Stage,
        business_id: "42".to_owned(),
        onboarding_id: Some("55".to_owned()),
        stage_id: None,
        status: OperationStatus::Success,
        title: "Stage Updated".to_owned(),
        description: "Stage 'Intake' has been updated by Dana".to_owned(),
        before_snapshot: Some(r#"{"name":"Intake"}"#.to_owned()),
        after_snapshot: Some(r#"{"name":"Intake","estimatedDuration":5}"#.to_owned()),
        changed_fields: Some(vec!["estimatedDuration".to_owned()]),
        extended_data: None,
        operator_id: "u-1".to_owned(),
        operator_name: "Dana".to_owned(),
        tenant_id: tenant_id.clone(),
        app_code: None,
        ip_address: Some("10.0.0.1".to_owned()),
        user_agent: None,
        source: Some("portal".to_owned()),
        operation_time: Utc::now() - Duration::minutes(minutes_ago),
    }
}

#[tokio::test]
async fn insert_and_list_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresChangeLogRepository::new(pool);
    let tenant_id = tenant();
    let older = record(&tenant_id, 10);
    let newer = record(&tenant_id, 1);

    assert!(repository.insert(&older).await.is_ok());
    assert!(repository.insert(&newer).await.is_ok());

    let filter = LogFilter {
        business_module: Some(BusinessModule::Stage),
        business_id: Some("42".to_owned()),
        ..LogFilter::default()
    };
    let listed = repository
        .list(&tenant_id, &filter)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id);
    assert_eq!(listed[0].changed_fields, newer.changed_fields);
    assert_eq!(listed[1].id, older.id);
}

#[tokio::test]
async fn duplicate_ids_surface_as_conflicts() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresChangeLogRepository::new(pool);
    let tenant_id = tenant();
    let entry = record(&tenant_id, 1);

    assert!(repository.insert(&entry).await.is_ok());
    assert!(matches!(
        repository.insert(&entry).await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn statistics_group_by_operation_type() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresChangeLogRepository::new(pool);
    let tenant_id = tenant();
    let mut created = record(&tenant_id, 3);
    created.operation_type = OperationType::Create;

    assert!(repository.insert(&record(&tenant_id, 1)).await.is_ok());
    assert!(repository.insert(&record(&tenant_id, 2)).await.is_ok());
    assert!(repository.insert(&created).await.is_ok());

    let statistics = repository
        .operation_statistics(&tenant_id, &LogFilter::default())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(statistics.get("update"), Some(&2));
    assert_eq!(statistics.get("create"), Some(&1));
}

#[tokio::test]
async fn tenants_are_isolated() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresChangeLogRepository::new(pool);
    let tenant_a = tenant();
    let tenant_b = tenant();

    assert!(repository.insert(&record(&tenant_a, 1)).await.is_ok());

    let listed = repository
        .list(&tenant_b, &LogFilter::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(listed.is_empty());
}
