pub mod payment;
pub mod profile;
pub mod transaction;

pub use payment::PaymentMethod;
pub use profile::Profile;
pub use transaction::{Transaction, TransactionMetadata, TransactionStatus, TransactionType};
