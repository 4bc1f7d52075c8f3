pub mod analyze_session;
pub mod blocks;
pub mod cli;
pub mod clustering;
pub mod config;
pub mod detection;
pub mod error;
pub mod metrics;
pub mod models;
pub mod profiles;
pub mod recovery;
pub mod refine;
pub mod smoothing;
pub mod storage;
pub mod strava_api;
pub mod types;
pub mod units;

#[cfg(feature = "python")]
mod py;

pub use analyze_session::{
    analyze_csv_json, analyze_session, analyze_stream, analyze_streams_json, AnalyzeInputs,
};
pub use cli::{print_report, render_report};
pub use config::{
    AnalysisConfig, CardioFilter, ClassificationConfig, KeyMode, PatternConfig, RelativeFilter,
};
pub use error::{CoreError, CoreResult};
pub use models::{Sample, SessionMeta, Stream};
pub use profiles::ScaleProfile;
pub use storage::{
    load_config, load_meta, meta_path_for, read_stream_csv, save_config, save_meta,
    write_stream_csv,
};
pub use strava_api::{parse_activity_meta, parse_streams, StravaClient};
pub use types::{
    Block, ClassifiedGroup, ClusterGroup, ClusterKey, GroupSummary, Interval, PatternHint,
    RecoverySegment, RepeatClass, SessionReport,
};
pub use units::Pace;
