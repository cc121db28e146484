use crate::{error::Result, management::SessionContext, output::Formatter, success};

pub async fn login(ctx: &mut SessionContext, out: &dyn Formatter) -> Result<()> {
    let principal = ctx.login().await?.principal_name().to_string();
    success!("Logged in as user: {}", principal);

    let user = ctx.client()?.me().await?;
    println!("{}", out.user(&user)?);
    Ok(())
}

pub async fn logout(ctx: &mut SessionContext) -> Result<()> {
    ctx.logout().await?;
    success!("Logged out.");
    Ok(())
}

pub async fn user(ctx: &mut SessionContext, out: &dyn Formatter) -> Result<()> {
    ctx.ensure_authenticated().await?;
    let user = ctx.client()?.me().await?;
    println!("{}", out.user(&user)?);
    Ok(())
}
