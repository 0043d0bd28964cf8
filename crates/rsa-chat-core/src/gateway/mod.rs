//! Typed client side of the remote crypto service.
//!
//! The service owns every private key and does all the arithmetic; the
//! client only ever sees public material and opaque blobs. Each call is a
//! single stateless round trip.

use async_trait::async_trait;

use crate::error::GatewayError;

pub mod api;
mod http;

pub use api::{
    Ciphertext, DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse,
    GenerateKeysResponse, SignatureBlob, WireKey,
};
pub use http::HttpGateway;

#[async_trait]
pub trait CryptoGateway: Send + Sync {
    async fn generate_keys(&self) -> Result<GenerateKeysResponse, GatewayError>;
    async fn encrypt(&self, request: &EncryptRequest) -> Result<EncryptResponse, GatewayError>;
    async fn decrypt(&self, request: &DecryptRequest) -> Result<DecryptResponse, GatewayError>;
}
