// Market data domain
pub mod market;

// Model input layout
pub mod ml;

// Port interfaces
pub mod ports;

// Screening results domain
pub mod screening;

// Data integrity checks
pub mod validation;

// Domain-specific error types
pub mod errors;
