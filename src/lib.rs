pub mod client;
pub mod config;
pub mod domain;
pub mod enricher;
pub mod error;
pub mod rates;
pub mod validation;
pub mod valuation;

pub use client::{BalanceSummary, LocalTransactionFilters, MyPtsClient, TransactionPage};
pub use config::{AuthTokens, Config};
pub use enricher::{EnrichmentOutcome, MetadataEnricher, ProfileCache, ProfileSource};
pub use error::ClientError;
pub use rates::{RateResolver, RateSource, ResolvedRate};
