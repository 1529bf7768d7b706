//! One-shot history fetch performed at session start.

use anyhow::Result;
use shared::protocol::ChatRecord;

/// `GET {api_base}/recent`, ascending chronological order assumed, no
/// pagination. Failure is handled by the caller: the session proceeds with
/// an empty history rather than blocking the live channel or input.
pub(crate) async fn fetch_recent(
    http: &reqwest::Client,
    api_base: &str,
) -> Result<Vec<ChatRecord>> {
    let records: Vec<ChatRecord> = http
        .get(format!("{api_base}/recent"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(records)
}
