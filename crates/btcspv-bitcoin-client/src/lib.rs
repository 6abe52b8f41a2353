//! Bitcoin RPC client for fetching the blocks and headers needed to assemble SPV proofs,
//! with retry logic for transport failures.

use base64::{engine::general_purpose, Engine as _};
use bitcoin::block::Header as BlockHeader;
use bitcoin::consensus::Decodable;
use bitcoin::{Block, BlockHash, Txid};
use bitcoincore_rpc_json::{GetBlockHeaderResult, GetRawTransactionResult};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HeaderMap, HeaderValue, HttpClient};
use jsonrpsee::rpc_params;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Error types for Bitcoin RPC client operations
#[derive(Error, Debug)]
pub enum BitcoinClientError {
    /// RPC client errors
    #[error("RPC client error: {0}")]
    RpcClient(#[from] jsonrpsee::core::client::Error),
    /// Invalid HTTP header value
    #[error("Invalid HTTP header value")]
    InvalidHeader,
    /// Failed to decode hex response
    #[error("Failed to decode hex response: {0}")]
    HexDecode(#[from] hex::FromHexError),
    /// Failed to deserialize Bitcoin consensus data
    #[error("Failed to deserialize Bitcoin data: {0}")]
    BitcoinDeserialization(#[from] bitcoin::consensus::encode::Error),
    /// The node knows the transaction but not a block containing it
    #[error("Transaction {0} is not confirmed in any block")]
    UnconfirmedTransaction(Txid),
}

/// Default HTTP request timeout
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bitcoin RPC client
pub struct BitcoinClient {
    client: HttpClient,
    backoff: backoff::ExponentialBackoff,
}

impl BitcoinClient {
    /// Create a new Bitcoin RPC client with default retry settings (exponential backoff).
    ///
    /// `userpwd` is a `user:password` pair sent as HTTP basic auth.
    pub fn new(url: String, userpwd: Option<String>) -> Result<Self, BitcoinClientError> {
        let mut headers = HeaderMap::new();
        if let Some(userpwd) = userpwd {
            let creds = general_purpose::STANDARD.encode(userpwd);
            headers.insert(
                "Authorization",
                HeaderValue::from_str(&format!("Basic {creds}"))
                    .map_err(|_| BitcoinClientError::InvalidHeader)?,
            );
        };

        let client = HttpClient::builder()
            .set_headers(headers)
            .request_timeout(HTTP_REQUEST_TIMEOUT)
            .build(url)?;

        Ok(Self {
            client,
            backoff: backoff::ExponentialBackoff::default(),
        })
    }

    /// Request a hex-encoded consensus object and decode it
    async fn request_decode<T: Decodable>(
        &self,
        method: &str,
        params: ArrayParams,
    ) -> Result<T, BitcoinClientError> {
        request_with_retry(self.backoff.clone(), || async {
            let res_hex: String = self.client.request(method, params.clone()).await?;
            let res_bytes = hex::decode(&res_hex)?;
            bitcoin::consensus::deserialize(&res_bytes).map_err(Into::into)
        })
        .await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: ArrayParams,
    ) -> Result<T, BitcoinClientError> {
        request_with_retry(self.backoff.clone(), || async {
            self.client
                .request(method, params.clone())
                .await
                .map_err(Into::into)
        })
        .await
    }

    /// Get block hash by height
    pub async fn get_block_hash(&self, height: u32) -> Result<BlockHash, BitcoinClientError> {
        self.request("getblockhash", rpc_params![height]).await
    }

    /// Get block header by hash
    pub async fn get_block_header(
        &self,
        hash: &BlockHash,
    ) -> Result<BlockHeader, BitcoinClientError> {
        self.request_decode("getblockheader", rpc_params![hash.to_string(), false])
            .await
    }

    /// Get block header by hash with extended data (height, confirmations, neighbours)
    pub async fn get_block_header_ex(
        &self,
        hash: &BlockHash,
    ) -> Result<GetBlockHeaderResult, BitcoinClientError> {
        self.request("getblockheader", rpc_params![hash.to_string(), true])
            .await
    }

    /// Get the full block, including every transaction, by hash
    pub async fn get_block(&self, hash: &BlockHash) -> Result<Block, BitcoinClientError> {
        self.request_decode("getblock", rpc_params![hash.to_string(), 0])
            .await
    }

    /// Get the hash of the block containing the transaction.
    ///
    /// Requires the node to run with `-txindex` unless the transaction is in its mempool,
    /// in which case [`BitcoinClientError::UnconfirmedTransaction`] is returned.
    pub async fn get_transaction_block_hash(
        &self,
        txid: &Txid,
    ) -> Result<BlockHash, BitcoinClientError> {
        let result: GetRawTransactionResult = self
            .request("getrawtransaction", rpc_params![txid.to_string(), true])
            .await?;
        result
            .blockhash
            .ok_or(BitcoinClientError::UnconfirmedTransaction(*txid))
    }

    /// Get current chain height
    pub async fn get_block_count(&self) -> Result<u32, BitcoinClientError> {
        let result: u64 = self.request("getblockcount", rpc_params![]).await?;
        Ok(result as u32)
    }
}

/// Execute a request with retry logic using exponential backoff.
/// Only transport-level failures are retried.
async fn request_with_retry<F, Fut, T>(
    backoff: backoff::ExponentialBackoff,
    operation: F,
) -> Result<T, BitcoinClientError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, BitcoinClientError>>,
{
    use backoff::{future::retry_notify, Error};

    retry_notify(
        backoff,
        || async {
            operation().await.map_err(|err| {
                if is_retryable_error(&err) {
                    Error::transient(err)
                } else {
                    Error::permanent(err)
                }
            })
        },
        |err, duration| {
            debug!("Request failed, retrying in {:?}: {}", duration, err);
        },
    )
    .await
}

/// Whether the error is an HTTP-level failure worth retrying
fn is_retryable_error(err: &BitcoinClientError) -> bool {
    use jsonrpsee::core::client::Error as RpcError;

    matches!(
        err,
        BitcoinClientError::RpcClient(
            RpcError::Transport(_)
                | RpcError::RequestTimeout
                | RpcError::RestartNeeded(_)
                | RpcError::ServiceDisconnect
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use jsonrpsee::core::client::Error as RpcError;

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable_error(&BitcoinClientError::RpcClient(
            RpcError::RequestTimeout
        )));
        assert!(is_retryable_error(&BitcoinClientError::RpcClient(
            RpcError::ServiceDisconnect
        )));
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!is_retryable_error(&BitcoinClientError::RpcClient(
            RpcError::Custom("Method not found".to_string())
        )));
        assert!(!is_retryable_error(&BitcoinClientError::InvalidHeader));
        assert!(!is_retryable_error(&BitcoinClientError::HexDecode(
            hex::FromHexError::OddLength
        )));
        assert!(!is_retryable_error(
            &BitcoinClientError::UnconfirmedTransaction(Txid::all_zeros())
        ));
    }

    #[tokio::test]
    async fn test_client_construction() {
        assert!(BitcoinClient::new(
            "http://127.0.0.1:8332".to_string(),
            Some("user:password".to_string())
        )
        .is_ok());
        assert!(BitcoinClient::new("http://127.0.0.1:8332".to_string(), None).is_ok());
        assert!(BitcoinClient::new("not a url".to_string(), None).is_err());
    }
}
