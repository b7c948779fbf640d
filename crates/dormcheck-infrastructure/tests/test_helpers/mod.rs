#![allow(dead_code)]

use std::sync::Arc;

use dormcheck_domain::task::{GeoLocation, SignTask, SignTime, TaskDetails};
use dormcheck_domain::{AccountId, OwnerId};
use dormcheck_infrastructure::persistence::Database;
use dormcheck_infrastructure::security::SecretCipher;

/// Migrated in-memory database
pub async fn setup_in_memory_db() -> Database {
    let db = Database::in_memory().await.expect("open in-memory db");
    db.run_migrations().await.expect("run migrations");
    db
}

pub fn test_cipher() -> Arc<SecretCipher> {
    Arc::new(SecretCipher::derive("test-master-password", &[7u8; 32]).expect("derive cipher"))
}

pub fn details(sign_time: &str) -> TaskDetails {
    TaskDetails {
        display_name: "张三".to_string(),
        activity_name: "晚归签到".to_string(),
        location: GeoLocation::new("西南医科大学忠山校区", 105.443_352, 28.913_41).expect("location"),
        sign_time: sign_time.parse::<SignTime>().expect("sign time"),
        max_retry: 3,
        notify_email: Some("owner@example.com".to_string()),
    }
}

pub fn task(owner: i64, account: &str, activity: &str, sign_time: &str) -> SignTask {
    SignTask::new(
        OwnerId::new(owner),
        AccountId::new(account).expect("account id"),
        activity,
        details(sign_time),
    )
    .expect("create task")
}
