//! A [Rootstock JSON RPC] client, [sans I/O]. (Bring your own sync/async HTTP client!)
//!
//! This library handles the protocol-layer aspects of the Ethereum-compatible JSON RPC API served
//! by Rootstock nodes, including ser-de and request-response abstractions. Only the transaction
//! receipt lookup is implemented.
//!
//! [Rootstock JSON RPC]: https://dev.rootstock.io/node-operators/json-rpc/
//! [sans I/O]: https://sans-io.readthedocs.io/how-to-sans-io.html
//!
//! # Sync example with `ureq`
//!
//! ```no_run
//! use rootrpc::{Receipt, Rpc};
//!
//! fn main() -> anyhow::Result<()> {
//!     let agent = ureq::agent();
//!     let rpc = Rpc::new("https://rpc.testnet.rootstock.io/API_KEY")?;
//!     let tx_hash = "0xd1a4a1e7a1f0a9b4b1c1fbc5ec9b2cd39a7e7c6f1d4c1f9a2b8e8e6c5d4f3a2b";
//!
//!     let mut resp = agent.run(rpc.get_transaction_receipt(tx_hash))?;
//!
//!     let receipt = Receipt::from_rpc_reader(resp.body_mut().as_reader())?;
//!
//!     println!("{receipt:#?}");
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub use self::receipt::{Error, Receipt};
pub use http;
use http::header::CONTENT_TYPE;
use http::{Request, Uri};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

mod receipt;

const VERSION: &str = "2.0"; // JSON RPC version
const GET_TX_RECEIPT: &str = "eth_getTransactionReceipt"; // get_transaction_receipt() method

pub type Req = Request<String>;

/// Errors returned by [`Rpc::new`].
#[derive(Debug, thiserror::Error)]
pub enum UriError {
    /// The endpoint could not be parsed.
    #[error("Invalid RPC endpoint")]
    Http(#[from] http::Error),

    /// The endpoint is relative or has no host, e.g. `/hello/world`, `data:`, or `mailto:`.
    #[error("RPC endpoint `{0}` must have both a scheme and a host")]
    NotAbsolute(Uri),
}

/// The main JSON RPC client.
///
/// Cloning is cheap, and clones share the request ID counter.
#[derive(Clone, Debug)]
pub struct Rpc {
    req: Req,
    id: Arc<AtomicU64>,
}

impl Rpc {
    /// JSON RPC client constructor.
    ///
    /// The API endpoint string must be a valid [`Uri`] with both a scheme and host component.
    /// For hosted Rootstock nodes the access key is the last path segment.
    ///
    /// # Example
    ///
    /// ```
    /// # use rootrpc::Rpc;
    /// # fn main() -> anyhow::Result<()> {
    /// let rpc = Rpc::new("https://rpc.testnet.rootstock.io/API_KEY")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<U>(api: U) -> Result<Self, UriError>
    where
        U: TryInto<Uri>,
        <U as TryInto<Uri>>::Error: Into<http::Error>,
    {
        let req = Request::post(api)
            .header(CONTENT_TYPE, "application/json")
            .body(String::new())?;
        if req.uri().scheme().is_none() || req.uri().host().is_none() {
            return Err(UriError::NotAbsolute(req.uri().clone()));
        }
        let id = Arc::new(AtomicU64::new(0));

        Ok(Self { req, id })
    }

    /// The endpoint that all requests are sent to.
    pub fn uri(&self) -> &Uri {
        self.req.uri()
    }

    /// Get a transaction receipt by transaction hash.
    ///
    /// The hash is sent as-is. Validating it is left to the node, which answers malformed hashes
    /// with a JSON RPC error.
    ///
    /// Returns a [`Req`] which can be sent by your preferred HTTP client.
    ///
    /// The response can be parsed with [`Receipt::from_rpc_reader`] and friends.
    pub fn get_transaction_receipt(&self, tx_hash: &str) -> Req {
        let id = self.id.fetch_add(1, Ordering::Relaxed);
        let rpc = json!({
            "jsonrpc": VERSION,
            "method": GET_TX_RECEIPT,
            "params": [tx_hash],
            "id": id,
        });

        let mut req = self.req.clone();
        req.body_mut().push_str(&rpc.to_string());

        req
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct ReceiptRpc {
        jsonrpc: String,
        method: String,
        params: Vec<String>,
        id: u64,
    }

    #[test]
    fn test_get_transaction_receipt() {
        let client = Rpc::new("https://rpc.testnet.rootstock.io/secret-key").unwrap();
        let tx_hash = "0x9e8c5cbc1ac5ab8c1c9a4d5c0b9e7b4d0b1f6d1d6a3ef3f1f5e4e5a6b7c8d9e0";
        let req = client.get_transaction_receipt(tx_hash);
        let uri = req.uri();

        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(uri.scheme_str(), Some("https"));
        assert_eq!(uri.host(), Some("rpc.testnet.rootstock.io"));
        assert_eq!(uri.path(), "/secret-key");
        assert!(uri.query().is_none());
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");

        let rpc: ReceiptRpc = serde_json::from_str(req.body()).unwrap();

        assert_eq!(rpc.jsonrpc, VERSION);
        assert_eq!(rpc.method, GET_TX_RECEIPT);
        assert_eq!(rpc.params, [tx_hash]);
        assert_eq!(rpc.id, 0);
    }

    #[test]
    fn test_hash_is_not_validated() {
        let client = Rpc::new("https://rpc.testnet.rootstock.io/").unwrap();

        for tx_hash in ["", "not a hash", "0x\"quoted\""] {
            let req = client.get_transaction_receipt(tx_hash);
            let rpc: ReceiptRpc = serde_json::from_str(req.body()).unwrap();

            assert_eq!(rpc.params, [tx_hash]);
        }
    }

    #[test]
    fn test_missing_api_key() {
        let client = Rpc::new("https://rpc.testnet.rootstock.io/").unwrap();

        assert_eq!(client.uri().path(), "/");
    }

    #[test]
    fn test_relative_uri() {
        assert!(matches!(
            Rpc::new("/hello/world"),
            Err(UriError::NotAbsolute(_)),
        ));
        assert!(matches!(Rpc::new("not a uri"), Err(UriError::Http(_))));
    }

    #[test]
    fn test_many_requests() {
        let client = Rpc::new("http://localhost:4444").unwrap();
        let tx_hash = "0x01";

        let req = client.get_transaction_receipt(tx_hash);
        let rpc: ReceiptRpc = serde_json::from_str(req.body()).unwrap();
        assert_eq!(rpc.id, 0);

        // Clones share the counter.
        let clone = client.clone();
        let req = clone.get_transaction_receipt(tx_hash);
        let rpc: ReceiptRpc = serde_json::from_str(req.body()).unwrap();
        assert_eq!(rpc.id, 1);

        let req = client.get_transaction_receipt(tx_hash);
        let rpc: ReceiptRpc = serde_json::from_str(req.body()).unwrap();
        assert_eq!(rpc.id, 2);
    }
}
