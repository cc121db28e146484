use crate::{error::Result, management::SessionContext, output::Formatter};

pub async fn lists(ctx: &mut SessionContext, out: &dyn Formatter) -> Result<()> {
    ctx.ensure_authenticated().await?;
    println!("{}", out.lists(ctx.lists().entries())?);
    Ok(())
}
