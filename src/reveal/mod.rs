pub mod acquire;
pub mod ranking;
pub mod registry;
pub mod sample;
pub mod session;
pub mod timeline;

pub use acquire::{acquire_results, poll_token_from_location, Acquisition};
pub use ranking::compute_ranked_results;
pub use registry::{Lookup, RevealRegistry};
pub use session::{RevealSession, RevealStage};
pub use timeline::{bar_fraction, RevealSchedule};
