use crate::{error::Result, models::FormSession, services::chat_completion_service::ChatCompletionClient};

/// Applies a change of the form's search query.
///
/// The query is always recorded. An empty query clears the result without
/// calling out. Otherwise the reply text replaces the result verbatim; if the
/// call fails the previous result is left untouched and the error returned.
pub async fn apply_search_query(
    session: &mut FormSession,
    query: String,
    chat: &ChatCompletionClient,
) -> Result<()> {
    session.search_query = query;

    if session.search_query.is_empty() {
        session.search_result.clear();
        return Ok(());
    }

    let reply = chat.complete(&session.search_query).await?;
    session.search_result = reply;

    Ok(())
}
