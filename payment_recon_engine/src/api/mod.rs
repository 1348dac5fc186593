mod recon_api;

pub use recon_api::{ReconOutcome, ReconciliationApi};
