pub mod slots;
pub mod store;

pub use slots::SlotService;
pub use store::AvailabilityStore;
