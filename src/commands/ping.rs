use super::connect;
use crate::GlobalArgs;
use anyhow::Result;

pub async fn run(global: &GlobalArgs) -> Result<()> {
    let client = connect(global, "ping")?;
    let elapsed = client.ping().await?;
    println!(
        "API endpoint {} responded in {} ms",
        client.endpoint(),
        elapsed.as_millis()
    );
    Ok(())
}
