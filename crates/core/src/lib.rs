pub mod config;
pub mod gateway;
pub mod restorer;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, ApiConfig, Config, ConfigError,
    ScheduleConfig,
};
pub use gateway::{
    read_token, AccountId, ApiResponse, GatewayError, HttpGateway, ReleaseCode, ReleaseService,
};
pub use restorer::{
    classify, CycleReport, RestorationOutcome, Restorer, RestorerConfig, RestorerError,
    SweepOutput, SweepReport, WorkCatalog,
};
