use crate::error::ReconcileError;

/// Port trait wrapping the remote spreadsheet that holds the ledger.
///
/// Rows and columns are 1-based, as in the sheet itself. Implementations live in
/// `services::sheets` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteLedger: Send + Sync {
    /// Every row of the worksheet, banner and header included.
    async fn get_all_rows(&self) -> Result<Vec<Vec<String>>, ReconcileError>;

    async fn append_row(&self, row: Vec<String>) -> Result<(), ReconcileError>;

    async fn update_cell(&self, row: usize, column: usize, value: &str) -> Result<(), ReconcileError>;
}
