//! `postview users`: list the authors the posts filter accepts.

use tabled::Tabled;

use postview_core::{User, UsersController};

use super::Context;
use crate::error::CliError;
use crate::output::{self, LoadingSpinner};

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
}

fn user_row(u: &User) -> UserRow {
    UserRow {
        id: u.id,
        username: u.username.clone(),
        name: u.name.clone(),
        email: u.email.clone(),
    }
}

pub async fn handle(ctx: &Context) -> Result<(), CliError> {
    let fetcher = ctx.fetcher().await?;
    let controller = UsersController::new(ctx.feed.clone(), fetcher);
    let spinner = LoadingSpinner::attach(controller.loading(), "Loading users", ctx.quiet);

    let result = controller.load().await;
    spinner.finish();
    result?;

    let users = controller.users().get();
    let out = output::render_list(&ctx.format, &users, user_row, User::filter_label)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
