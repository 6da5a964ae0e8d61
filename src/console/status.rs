// API liveness command.

use crate::client::ApiClient;
use crate::console::CommandError;

// Probes the protection API and prints its status.
//
// The probe itself never fails; an unreachable service renders as
// Offline and exits cleanly.
pub async fn run(client: &ApiClient) -> Result<(), CommandError> {
    let healthy = client.health().await;
    if healthy {
        println!("API status: Online");
    } else {
        println!("API status: Offline");
    }
    Ok(())
}
