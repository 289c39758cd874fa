//! List all VMs on a pool master.
//!
//! Usage: cargo run --example vm_list -- ws://pool-master:80/ root secret

use std::time::Duration;
use xapi_client::ClientBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let endpoint = args.next().unwrap_or_else(|| "ws://127.0.0.1:80/".into());
    let username = args.next().unwrap_or_else(|| "root".into());
    let password = args.next().unwrap_or_default();

    let client = ClientBuilder::new(endpoint)
        .timeout(Duration::from_secs(30))
        .build()?;

    client.login_with_password(&username, &password).await?;

    let vms = client.vm().call("get_all", vec![]).await?;
    if let Some(refs) = vms.as_array() {
        println!("{} VMs:", refs.len());
        for vm_ref in refs {
            let name = client
                .vm()
                .call("get_name_label", vec![vm_ref.clone()])
                .await?;
            println!("  {name}");
        }
    }

    client.logout().await?;
    Ok(())
}
