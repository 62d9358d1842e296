pub mod apontamento;
pub mod config;
pub mod db;
pub mod error;
pub mod files;
pub mod operator;
pub mod requests;
pub mod sequencing;
pub mod timing;

pub use config::{load_config, Config};
pub use db::Database;
pub use error::{ConfigError, Result, ShopfloorError, CODE_APONTAMENTO_OPEN};
pub use files::{resolve_step_file, StepFile};
pub use sequencing::JobFullDetails;
