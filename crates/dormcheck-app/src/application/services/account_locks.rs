use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use dormcheck_domain::AccountId;

/// One async mutex per platform account.
///
/// Held by the sign-in executor around session read + submit and by the
/// session refresher around authenticate + save, so an execution never sees
/// cookies that are being replaced.
#[derive(Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, account_id: &AccountId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(account_id.clone()).or_default())
        };
        lock.lock_owned().await
    }
}
