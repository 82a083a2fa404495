//! Demonstration endpoints served by the `rustygate` binary.

pub mod cars;

use crate::error::ConfigError;
use crate::handler::router::Router;

pub fn router() -> Result<Router, ConfigError> {
    Router::new().route("/cars", cars::handler())
}
