use tokio_util::sync::CancellationToken;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::resolve::{BatchReport, resolve_batch};

#[derive(Debug, Clone)]
pub struct ResolveCommandArgs {
    pub content: String,
}

pub async fn run(
    ctx: &AppContext,
    args: ResolveCommandArgs,
    cancel: &CancellationToken,
) -> AppResult<BatchReport> {
    resolve_batch(ctx, &args.content, cancel).await
}
