use anyhow::Result;

use super::Context;
use crate::repl;

pub async fn run(ctx: &Context) -> Result<()> {
    repl::run(ctx.session()).await
}
