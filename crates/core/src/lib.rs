//! # SegLens Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The segment lookup orchestrator and its retry policy
//! - The tabular result parser
//!
//! ## Architecture Principles
//! - Only depends on `seglens-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod lookup;

// Re-export specific items to avoid ambiguity
pub use lookup::ports::{AccessTokenSource, ElementRef, ExecutionHandle, IssuedToken, ReportingGateway};
pub use lookup::service::SegmentLookupService;
pub use lookup::tabular::parse_segment_ids;
