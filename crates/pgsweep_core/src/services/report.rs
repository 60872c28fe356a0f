//! Final output record.

use crate::error::SweepError;
use crate::models::ResultMap;

/// Serialize the whole result map to a JSON object string.
pub fn render(results: &ResultMap) -> Result<String, SweepError> {
    Ok(serde_json::to_string(results)?)
}

/// Emit the result map as one `output` record.
pub fn report(results: &ResultMap) -> Result<(), SweepError> {
    let rendered = render(results)?;
    tracing::info!(queries = results.len(), results = %rendered, "output");
    Ok(())
}
