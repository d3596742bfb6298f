pub mod cache;
pub mod country;
pub mod dedupe;
pub mod engine;
pub mod estimate;
pub mod filters;
pub mod geo;
pub mod quality;
pub mod store;
