use rootrpc::{Receipt, Rpc};
use std::env;
use ureq::tls::{TlsConfig, TlsProvider};
use ureq::Agent;

fn main() -> anyhow::Result<()> {
    let agent = Agent::from(
        Agent::config_builder()
            .tls_config(
                TlsConfig::builder()
                    .provider(TlsProvider::NativeTls)
                    .build(),
            )
            .build(),
    );
    let api_key = env::var("RSK_API_KEY").unwrap_or_default();
    let rpc = Rpc::new(format!("https://rpc.testnet.rootstock.io/{api_key}"))?;

    let tx_hash = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Missing transaction hash"))?;

    let mut resp = agent.run(rpc.get_transaction_receipt(&tx_hash))?;

    match Receipt::from_rpc_reader(resp.body_mut().as_reader())? {
        Some(receipt) => println!("{receipt:#?}"),
        None => println!("Transaction `{tx_hash}` has no receipt"),
    }

    Ok(())
}
