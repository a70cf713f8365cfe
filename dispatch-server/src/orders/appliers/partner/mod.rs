//! Partner event appliers

mod availability_changed;
mod delivery_credited;
mod earnings_rolled_over;
mod order_released;
mod order_reserved;
mod partner_registered;
mod rating_recorded;

pub use availability_changed::AvailabilityChangedApplier;
pub use delivery_credited::DeliveryCreditedApplier;
pub use earnings_rolled_over::EarningsRolledOverApplier;
pub use order_released::OrderReleasedApplier;
pub use order_reserved::OrderReservedApplier;
pub use partner_registered::PartnerRegisteredApplier;
pub use rating_recorded::RatingRecordedApplier;
