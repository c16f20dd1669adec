//! Selection machinery: triggers, eligibility, weighting, the catalog,
//! and the pipeline that drives them.

pub mod catalog;
pub mod clock;
pub mod context;
pub mod eligibility;
pub mod pipeline;
pub mod seeding;
pub mod trigger;
pub mod weighting;
