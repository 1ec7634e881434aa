//! Heuristic search for the truck record around a reference address.

pub mod constants;
#[doc(hidden)]
pub mod fixture;
mod legacy;
mod record;
mod scanner;
mod validator;
mod window;

pub use legacy::LegacyValidator;
pub use record::{Link, LinkMode, PointerPair, TruckRecord};
pub use scanner::{
    CandidateScanner, Detection, Direction, ExhaustReason, Fingerprint, ScanOutcome, ScanReport,
    ScanState,
};
pub use validator::{RECORD_CHECKS, RejectReason, StructureValidator, Verdict};
pub use window::{AddressSpaceModel, MemoryWindow};
