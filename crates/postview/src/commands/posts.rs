//! `postview posts`: drive a `PostsController` and render what it loaded.

use tabled::Tabled;
use tracing::debug;

use postview_core::{Post, PostsController, SortOrder};

use super::Context;
use crate::cli::{PostsArgs, SortDirection};
use crate::error::CliError;
use crate::output::{self, LoadingSpinner};

#[derive(Tabled)]
struct PostRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "User")]
    user_id: u64,
    #[tabled(rename = "Title")]
    title: String,
}

fn post_row(p: &Post) -> PostRow {
    PostRow {
        id: p.id,
        user_id: p.user_id,
        title: p.title.clone(),
    }
}

impl From<SortDirection> for SortOrder {
    fn from(d: SortDirection) -> Self {
        match d {
            SortDirection::Asc => SortOrder::Asc,
            SortDirection::Desc => SortOrder::Desc,
        }
    }
}

pub async fn handle(ctx: &Context, args: &PostsArgs) -> Result<(), CliError> {
    let fetcher = ctx.fetcher().await?;
    let controller = PostsController::new(ctx.feed.clone(), fetcher)?;
    let spinner = LoadingSpinner::attach(controller.loading(), "Loading posts", ctx.quiet);

    let result = run(&controller, args).await;
    controller.stop().await;
    spinner.finish();
    result?;

    let posts = controller.posts().get();
    if posts.is_empty() {
        if let Some(reason) = controller.error().get() {
            return Err(CliError::Api {
                message: reason,
                status: None,
            });
        }
    }

    let out = output::render_list(&ctx.format, &posts, post_row, Post::heading)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

async fn run(controller: &PostsController, args: &PostsArgs) -> Result<(), CliError> {
    controller.start().await?;

    if let Some(direction) = args.sort {
        controller.sort_by_title(Some(direction.into())).await?;
    }
    if let Some(user_id) = args.user_id {
        controller.filter_by_user(Some(user_id)).await?;
    }

    for _ in 1..args.pages {
        if controller.next_link().with(Option::is_none) {
            debug!("reached the last page");
            break;
        }
        controller.fetch_next_posts().await?;
        if controller.error().with(Option::is_some) {
            debug!("page fetch failed, keeping what was loaded");
            break;
        }
    }

    Ok(())
}
