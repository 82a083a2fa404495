pub mod dispatcher;
pub mod middleware;
pub mod responses;
pub mod router;

use std::sync::Arc;

use crate::config::AppConfig;
use middleware::{Compression, DateHeader, MiddlewareChain, RequestLogger, ResponseHeaders};

pub use dispatcher::{App, GatewayReply};
pub use router::{Handler, Router};

/// Built-in stages in their usual order: logging first, encoding last.
pub fn standard_middleware(config: &AppConfig) -> MiddlewareChain {
    let mut chain = MiddlewareChain::new()
        .with(Arc::new(RequestLogger))
        .with(Arc::new(
            ResponseHeaders::new().with("Server", &config.server_name),
        ))
        .with(Arc::new(DateHeader));

    if let Some(compression) = &config.compression {
        chain.push(Arc::new(Compression::new(
            compression.algorithm,
            compression.min_size,
        )));
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionConfig;
    use crate::handler::middleware::CompressionAlgorithm;

    #[test]
    fn compression_is_appended_only_when_configured() {
        let config = AppConfig::default();
        assert_eq!(
            standard_middleware(&config).names(),
            vec!["request_logger", "response_headers", "date_header"]
        );

        let config = AppConfig {
            compression: Some(CompressionConfig {
                algorithm: CompressionAlgorithm::Gzip,
                min_size: 0,
            }),
            ..AppConfig::default()
        };
        assert_eq!(standard_middleware(&config).len(), 4);
    }
}
