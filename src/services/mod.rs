pub mod board;
pub mod changefeed;
pub mod clock;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod session;
pub mod storage;
pub mod today;
