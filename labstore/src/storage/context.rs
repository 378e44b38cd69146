use crate::{AppError, Storage};
use log::warn;
use redb::{ReadTransaction, WriteTransaction};

impl Storage {
    /// Runs `f` in one write transaction, committed only if `f` succeeds.
    pub(crate) fn write<T>(&self, f: impl FnOnce(&WriteTransaction) -> Result<T, AppError>) -> Result<T, AppError> {
        let tx = self.db.begin_write()?;
        match f(&tx) {
            Ok(out) => {
                tx.commit()?;
                Ok(out)
            }
            Err(err) => {
                if let Err(abort_err) = tx.abort() {
                    warn!("Aborting write transaction failed: {}", abort_err);
                }
                Err(err)
            }
        }
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&ReadTransaction) -> Result<T, AppError>) -> Result<T, AppError> {
        let tx = self.db.begin_read()?;
        f(&tx)
    }
}
