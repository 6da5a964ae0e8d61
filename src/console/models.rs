// Model listing, model detail, and model selection fallback.

use crate::client::ApiClient;
use crate::console::CommandError;
use tracing::{info, warn};

// Lists the models offered by the protection service.
pub async fn run_list(client: &ApiClient) -> Result<(), CommandError> {
    let models = client.list_models().await?;
    if models.is_empty() {
        println!("No models available.");
        return Ok(());
    }

    println!("Available models:");
    for model in models {
        println!("  {:<24} {} ({})", model.id, model.name, model.provider);
    }
    Ok(())
}

// Prints the raw detail object for one model.
pub async fn run_detail(client: &ApiClient, model_id: &str) -> Result<(), CommandError> {
    let details = client.model_details(model_id).await?;
    let rendered = serde_json::to_string_pretty(&details)
        .map_err(|e| CommandError::Api(crate::client::ApiError::new(format!("Error: {e}"))))?;
    println!("{rendered}");
    Ok(())
}

// Resolves the model to submit with.
//
// When the requested id is absent from the fetched list, the first listed
// model is used instead. A failed model fetch keeps the requested id so a
// degraded model endpoint never blocks analysis.
pub async fn resolve_model(client: &ApiClient, requested: &str) -> String {
    let models = match client.list_models().await {
        Ok(models) => models,
        Err(e) => {
            warn!("Failed to load models, keeping requested id: {}", e);
            return requested.to_string();
        }
    };

    if models.is_empty() || models.iter().any(|m| m.id == requested) {
        return requested.to_string();
    }

    let fallback = models[0].id.clone();
    info!(
        "Model {} is not offered; falling back to {}",
        requested, fallback
    );
    fallback
}
