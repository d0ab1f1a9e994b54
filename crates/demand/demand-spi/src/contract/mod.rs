//! Contract module containing one trait per pipeline stage

mod decomposer;
mod forecaster;
mod linearity_analyzer;
mod model_selector;
mod series_validator;
mod stationarity_tester;

pub use decomposer::Decomposer;
pub use forecaster::Forecaster;
pub use linearity_analyzer::LinearityAnalyzer;
pub use model_selector::ModelSelector;
pub use series_validator::SeriesValidator;
pub use stationarity_tester::StationarityTester;
