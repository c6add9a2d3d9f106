//! Records exchanged with the CRM REST API.
//!
//! Each module mirrors one backend collection. Shapes follow the JSON the
//! backend emits (`_id`, camelCase fields); money is narrowed to [`Amount`]
//! on the way in.

pub mod amount;
pub mod deal;
pub mod lead;
pub mod meeting;
pub mod quotation;

pub use amount::{Amount, AmountError};
pub use deal::Stage;
