//! Driver registration and listing.

use store::{Driver, NewDriver, StoreError, StoreSession};

use crate::uow::UnitOfWork;

/// Registers a driver. A duplicate phone number surfaces as
/// [`StoreError::DuplicateItem`].
#[tracing::instrument(skip(uow), fields(phone = %new.phone_number))]
pub async fn create_driver<S: StoreSession>(
    new: NewDriver,
    uow: &mut UnitOfWork<S>,
) -> Result<Driver, StoreError> {
    uow.session().create_driver(new).await
}

#[tracing::instrument(skip(uow))]
pub async fn list_drivers<S: StoreSession>(
    uow: &mut UnitOfWork<S>,
) -> Result<Vec<Driver>, StoreError> {
    uow.session().fetch_drivers().await
}
