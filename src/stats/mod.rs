//! The statistics engine.
//!
//! Data flows store → [`filter`] → [`calculate`] → [`aggregate`] → rollups
//! and facets. Everything below [`Analyzer`] is pure and works on
//! request-local data.

pub mod aggregate;
pub mod analyzer;
pub mod calculator;
pub mod counter;
pub mod facets;
pub mod filter;
pub mod lenses;
pub mod rollup;
pub mod trends;

pub use aggregate::{aggregate, Analysis, ReportSection};
pub use analyzer::{AnalysisRequest, Analyzer, PhotoSource, Scope};
pub use calculator::{calculate, HitRateTally, LensBreakdown, Statistics};
pub use counter::FrequencyCounter;
pub use facets::{compute_facets, Facets};
pub use filter::{filter, FilterField, FilterSpec};
pub use lenses::{LensUsage, LensUsageSummary};
pub use rollup::{rollup, Rollup, RollupStats};
pub use trends::{monthly_trends, MonthlyTrend, Trends};
