//! Home listing.

use aircon_api::Home;
use aircon_core::SelectionStore;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Tabled)]
struct HomeRow {
    #[tabled(rename = "")]
    current: &'static str,
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
}

pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let homes = ctx
        .client
        .list_homes()
        .await
        .map_err(|e| CliError::from_relay(e, &ctx.url(), "homes"))?;
    let current = ctx.store().read().and_then(|s| s.home_id);

    let out = output::render_list(
        &global.output,
        &homes,
        |h: &Home| HomeRow {
            current: if Some(h.id) == current { "*" } else { "" },
            id: h.id,
            name: h.display_name(),
        },
        |h| h.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
