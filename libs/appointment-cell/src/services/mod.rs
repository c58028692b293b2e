pub mod availability;
pub mod directory;
pub mod lifecycle;
pub mod store;

pub use availability::SlotAvailabilityService;
pub use directory::{EntityDirectory, SupabaseDirectory};
pub use lifecycle::AppointmentLifecycleService;
pub use store::AppointmentStore;
