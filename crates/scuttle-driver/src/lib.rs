//! The offer-protocol driver and secrets client interfaces, plus
//! components E (resource cleaner) and F (uninstall recorder), plus
//! in-memory test-double implementations of both traits.

mod cleaner;
mod driver;
mod error;
mod fake;
mod recorder;
mod secrets;
mod simulate;

pub use cleaner::{clean_offers, AcceptedOffer, CleanOutcome};
pub use driver::{Driver, DriverEvent};
pub use error::DriverError;
pub use fake::{FakeDriver, FakeSecretsClient, RecordedCall};
pub use recorder::UninstallRecorder;
pub use secrets::SecretsClient;
pub use simulate::synthetic_offers;
