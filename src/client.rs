use crate::receipt::TransactionReceiptView;
use error_iter::ErrorIter as _;
use rootrpc::{Receipt, Rpc};
use std::{env, fmt, time::Instant};
use thiserror::Error;
use tracing::{info, trace};
use ureq::tls::{TlsConfig, TlsProvider};
use ureq::Agent;

/// Hosted Rootstock testnet node. The access key is appended as the last path segment.
pub const DEFAULT_RPC_URL: &str = "https://rpc.testnet.rootstock.io";

/// The public interface for the client API.
///
/// Exists as a trait so that unit tests can mock the client responses.
pub trait ReceiptApi {
    /// Get a transaction receipt by transaction hash.
    ///
    /// Makes exactly one request. The hash is not validated locally.
    fn fetch_receipt(&self, tx_hash: &str) -> Result<TransactionReceiptView, FetchError>;
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid RPC endpoint")]
    Endpoint(#[from] rootrpc::UriError),
}

/// Why a lookup did not produce a receipt. The `Display` impl is the user-facing message.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FetchError {
    #[error("Transaction not found!")]
    NotFound,

    #[error("{0}")]
    Transport(String),

    #[error("An unknown error occurred")]
    Unknown,
}

impl FetchError {
    /// Transport failure with the lower-level message passed through. Failures without a message
    /// become [`FetchError::Unknown`].
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            Self::Unknown
        } else {
            Self::Transport(message)
        }
    }
}

/// JSON RPC endpoint configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoint {
    base_url: String,
    api_key: String,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Read `RSK_RPC_URL` and `RSK_API_KEY` from the environment.
    ///
    /// A missing key is not an error here. The node rejects the request instead.
    pub fn from_env() -> Self {
        Self::new(
            env::var("RSK_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            env::var("RSK_API_KEY").unwrap_or_default(),
        )
    }

    /// The full endpoint URL, including the access key.
    pub fn url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.api_key)
    }
}

/// Displays the endpoint with the access key redacted, for logging.
impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base_url = self.base_url.trim_end_matches('/');
        if self.api_key.is_empty() {
            write!(f, "{base_url}/ (no access key)")
        } else {
            write!(f, "{base_url}/<redacted>")
        }
    }
}

/// A blocking JSON RPC client for receipt lookups.
pub struct RpcClient {
    agent: Agent,
    rpc: Rpc,
}

impl RpcClient {
    /// Create a new client for the given endpoint.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> Result<(), txreceipt::client::ClientError> {
    /// # use txreceipt::client::{Endpoint, RpcClient};
    /// let client = RpcClient::new(&Endpoint::new("http://localhost:4444", ""))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(endpoint: &Endpoint) -> Result<Self, ClientError> {
        let agent = Agent::from(
            Agent::config_builder()
                .tls_config(
                    TlsConfig::builder()
                        .provider(TlsProvider::NativeTls)
                        .build(),
                )
                .build(),
        );
        let rpc = Rpc::new(endpoint.url())?;

        Ok(Self { agent, rpc })
    }
}

impl ReceiptApi for RpcClient {
    fn fetch_receipt(&self, tx_hash: &str) -> Result<TransactionReceiptView, FetchError> {
        let thread_id = std::thread::current().id();

        info!("Fetching receipt for `{tx_hash}` on {thread_id:?}");

        let start = Instant::now();
        let req = self.rpc.get_transaction_receipt(tx_hash);
        let mut resp = self.agent.run(req).map_err(transport_error)?;

        let receipt = Receipt::from_rpc_reader(resp.body_mut().as_reader())
            .map_err(transport_error)?
            .ok_or(FetchError::NotFound)?;
        let dur = start.elapsed();

        info!("Receipt for `{tx_hash}` received in {dur:?}");
        trace!("{receipt:#?}");

        Ok(receipt.into())
    }
}

/// Flatten an error and its sources into a single message.
fn transport_error<E>(err: E) -> FetchError
where
    E: std::error::Error + 'static,
{
    let message = err
        .sources()
        .map(|source| source.to_string())
        .filter(|message| !message.is_empty())
        .collect::<Vec<_>>()
        .join(": ");

    FetchError::transport(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("Outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("Inner")]
    struct Inner;

    #[derive(Debug, Error)]
    #[error("")]
    struct Silent;

    #[test]
    fn test_fetch_error_messages() {
        assert_eq!(FetchError::NotFound.to_string(), "Transaction not found!");
        assert_eq!(FetchError::Unknown.to_string(), "An unknown error occurred");
        assert_eq!(
            FetchError::transport("connection refused").to_string(),
            "connection refused",
        );
        assert_eq!(FetchError::transport(""), FetchError::Unknown);
    }

    #[test]
    fn test_transport_error_chain() {
        assert_eq!(
            transport_error(Outer(Inner)),
            FetchError::Transport("Outer: Inner".to_string()),
        );
        assert_eq!(transport_error(Silent), FetchError::Unknown);
    }

    #[test]
    fn test_rpc_error_is_verbatim() {
        let err = rootrpc::Receipt::from_rpc_str(
            r#"{"error": {"code": -32602, "message": "invalid argument 0"}}"#,
        )
        .unwrap_err();

        assert_eq!(
            transport_error(err),
            FetchError::Transport("invalid argument 0".to_string()),
        );
    }

    #[test]
    fn test_endpoint_url() {
        let endpoint = Endpoint::new(DEFAULT_RPC_URL, "abc123");
        assert_eq!(endpoint.url(), "https://rpc.testnet.rootstock.io/abc123");
        assert_eq!(
            endpoint.to_string(),
            "https://rpc.testnet.rootstock.io/<redacted>",
        );

        let endpoint = Endpoint::new("http://localhost:4444/", "");
        assert_eq!(endpoint.url(), "http://localhost:4444/");
        assert_eq!(endpoint.to_string(), "http://localhost:4444/ (no access key)");
    }

    #[test]
    fn test_client_rejects_relative_endpoint() {
        let endpoint = Endpoint::new("/relative", "key");

        assert!(matches!(
            RpcClient::new(&endpoint),
            Err(ClientError::Endpoint(_)),
        ));
    }
}
