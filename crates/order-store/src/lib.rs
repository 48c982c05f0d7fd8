//! Order store: the authoritative record of customers, orders and the
//! append-only order processing log.
//!
//! [`OrderStore`] is the narrow contract the ingestion service, the read
//! path and the fulfillment worker call through. Two implementations share
//! the same semantics: [`PostgresOrderStore`] for deployment and
//! [`InMemoryOrderStore`] for tests.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod report;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use report::{DEFAULT_REPORT_WINDOW_DAYS, OrderReport, ReportLine, StatusCount};
pub use store::{OrderStore, OrderStoreExt};
