//! Loading networks from JSON files.

use std::path::Path;

use crate::error::ModelError;
use crate::network::{DiscreteNetwork, NetworkSpec};

/// Parses and validates a network from JSON bytes, fingerprinting the content.
///
/// # Errors
///
/// Returns `ModelError::Decode` for malformed JSON and any validation error
/// from [`DiscreteNetwork::from_spec`].
pub fn parse_model(bytes: &[u8]) -> Result<DiscreteNetwork, ModelError> {
    let spec: NetworkSpec = serde_json::from_slice(bytes)?;
    let fingerprint = blake3::hash(bytes).to_hex().to_string();
    Ok(DiscreteNetwork::from_spec(spec)?.with_fingerprint(fingerprint))
}

/// Loads a network once at startup.
///
/// # Errors
///
/// Returns `ModelError::Io` if the file cannot be read, otherwise see [`parse_model`].
pub fn load_model(path: impl AsRef<Path>) -> Result<DiscreteNetwork, ModelError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let network = parse_model(&bytes)?;
    tracing::info!(
        path = %path.display(),
        name = network.name(),
        nodes = network.nodes().count(),
        parameters = network.total_parameters(),
        fingerprint = network.fingerprint().unwrap_or_default(),
        "model loaded"
    );
    Ok(network)
}
