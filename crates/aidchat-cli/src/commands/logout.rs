use anyhow::Result;

use super::Context;

pub fn run(ctx: &Context) -> Result<()> {
    if ctx.auth().logout()? {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}
