// Server module - Pingora HTTP server setup and lifecycle
//
// run_forever() owns the signal handling: SIGTERM stops accepting and drains
// in-flight requests, SIGINT exits immediately.

pub mod context;
pub mod cors;
pub mod endpoints;
pub mod service;

pub use context::RequestContext;
pub use cors::{CorsDecision, CorsPolicy};
pub use endpoints::EndpointResponse;
pub use service::ImageService;

use pingora::server::configuration::Opt as ServerOpt;
use pingora_core::server::Server;

use crate::config::Config;
use crate::error::ServiceError;

/// Process-level switches passed through to Pingora
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub daemon: bool,
    pub test: bool,
    pub upgrade: bool,
}

impl RunOptions {
    pub fn to_server_opt(self) -> ServerOpt {
        ServerOpt {
            daemon: self.daemon,
            test: self.test,
            upgrade: self.upgrade,
            ..Default::default()
        }
    }
}

/// Create the Pingora server with the image service listening on the
/// configured address
pub fn build_server(config: &Config, options: RunOptions) -> Result<Server, ServiceError> {
    let mut server = Server::new(Some(options.to_server_opt()))
        .map_err(|e| ServiceError::Internal(format!("Failed to create server: {}", e)))?;
    server.bootstrap();

    let service = ImageService::new(config);
    let mut http_service = pingora_proxy::http_proxy_service(&server.configuration, service);

    let listen_addr = config.listen_address();
    http_service.add_tcp(&listen_addr);
    http_service.threads = Some(config.server.threads);

    tracing::info!(
        address = %listen_addr,
        threads = config.server.threads,
        image_dir = %config.storage.image_dir.display(),
        "Image service configured"
    );

    server.add_service(http_service);
    Ok(server)
}
