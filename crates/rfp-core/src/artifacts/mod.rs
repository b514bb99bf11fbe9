//! Artifact builders (L14): Win-Plan DOCX, RFI response PDF, and the
//! supplemental Word proposal composer. Each consumes a pure data object
//! (no DB handle), is deterministic and idempotent for the same input, and
//! never touches the network.

mod docx_writer;
pub mod fonts;
pub mod rfi_pdf;
pub mod win_plan;
pub mod word_proposal;

pub use rfi_pdf::{build_rfi_pdf, RfiDocument, RfiSection};
pub use win_plan::build_win_plan_docx;
pub use word_proposal::build_word_proposal;
