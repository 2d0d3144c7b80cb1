use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Store(#[from] scuttle_store::StoreError),

    #[error(transparent)]
    Driver(#[from] scuttle_driver::DriverError),
}
