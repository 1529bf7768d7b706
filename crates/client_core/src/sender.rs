//! Outbound send over the request/response surface, independent of the live
//! channel.

use anyhow::Result;
use shared::protocol::ChatRecord;

/// `POST {api_base}/message`. The response body is ignored; the caller does
/// not wait for the live echo.
pub(crate) async fn post_message(
    http: &reqwest::Client,
    api_base: &str,
    record: &ChatRecord,
) -> Result<()> {
    http.post(format!("{api_base}/message"))
        .json(record)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
