pub mod batch;
pub mod matcher;
pub mod resolver;
pub mod source;

pub use batch::{resolve_batch, BatchOptions, BatchOutcome, BatchSummary};
pub use matcher::{
    match_candidates, MatchPolicy, MatchResult, NameStrength, DEFAULT_MAX_DISTANCE_M,
};
pub use resolver::{PoiTierStatus, ResolutionReport, ResolverSettings, TieredResolver};
pub use source::{AddressGeocoder, PoiSource};
