//! The Plume post ledger program.
//!
//! This crate is the only write path into post storage. It provides:
//! - The signed [`CreatePost`] instruction and its canonical signing message
//! - Field and signer validation with stable [`ErrorCode`]s
//! - [`PostProgram`], which stamps, encodes, and commits new records
//! - The [`Clock`] seam the program takes creation times from

pub mod clock;
pub mod error;
pub mod instruction;
pub mod program;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ErrorCode, ProgramError};
pub use instruction::CreatePost;
pub use program::{CreateReceipt, PostProgram};
pub use validation::{validate_fields, verify_signer};
