pub(crate) mod rx;
pub(crate) mod tx;

pub use rx::{AcceptOutcome, RxWindow};
pub use tx::{AckOutcome, TxWindow};
