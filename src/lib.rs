// Transaction Geoflow - Core Library
// Payment transactions → geocoded, anonymized routes for map animation

pub mod config;
pub mod error;
pub mod geocode;
pub mod logging;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod projection;
pub mod reference;
pub mod rules;
pub mod sequencer;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{GeoflowError, Result};
pub use geocode::{EnrichedTransaction, JoinMiss};
pub use normalize::{NormalizedTransaction, PostalKey, Rejection};
pub use parser::{Passthrough, RawTransaction, TransactionReader};
pub use pipeline::{convert, convert_to_file, Conversion, ConversionReport, Pipeline};
pub use projection::{OutputRecord, PassthroughFields};
pub use reference::{Coordinate, Degrees, GeoLookupEntry, PostalIndex, ReferenceCache};
pub use rules::{PostalRule, PostalTransform, RuleTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
