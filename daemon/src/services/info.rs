use sandybox_core::{
    InitializeParams, InitializeResult, PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
    ServerCapabilities, ServerInfo, ToolsCapability,
};

const NAME: &str = "Sandybox";
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn server_info() -> ServerInfo {
    ServerInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
    }
}

/// Answers `initialize`. The client's protocol version is echoed back when
/// it is one this server supports, otherwise the server proposes its own.
pub fn initialize(params: InitializeParams) -> InitializeResult {
    if let Some(client) = &params.client_info {
        tracing::info!("Client connected: {} {}", client.name, client.version);
    }

    InitializeResult {
        protocol_version: negotiate_version(params.protocol_version.as_deref()).to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
        },
        server_info: server_info(),
    }
}

fn negotiate_version(requested: Option<&str>) -> &'static str {
    match requested {
        Some(version) => SUPPORTED_PROTOCOL_VERSIONS
            .iter()
            .copied()
            .find(|supported| *supported == version)
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Client asked for protocol {}, offering {}",
                    version,
                    PROTOCOL_VERSION
                );
                PROTOCOL_VERSION
            }),
        None => PROTOCOL_VERSION,
    }
}
