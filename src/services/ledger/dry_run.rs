use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::{LedgerClient, LedgerRecord};
use crate::error::LedgerError;

/// Used when no relay is configured: logs the memo and mints a local proof id.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunLedger;

#[async_trait]
impl LedgerClient for DryRunLedger {
    async fn submit(&self, record: &LedgerRecord) -> Result<String, LedgerError> {
        let proof = format!("dryrun-{}", Uuid::new_v4());
        info!(vehicle = %record.vehicle_id, memo = %record.memo, %proof, "Dry-run ledger record");
        Ok(proof)
    }
}
