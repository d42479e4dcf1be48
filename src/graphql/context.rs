use async_graphql::{Context, Request, Result};

use crate::extractors::Viewer;
use crate::loaders::Loaders;
use crate::state::Repositories;

/// Attach the per-request data every resolver expects: the viewer and a
/// fresh set of batch loaders.
pub fn prepare_request(request: Request, repos: &Repositories, viewer: Viewer) -> Request {
    request
        .data(viewer)
        .data(Loaders::new(repos.users.clone(), repos.votes.clone()))
}

/// Requests executed without a viewer are anonymous.
pub fn viewer(ctx: &Context<'_>) -> Viewer {
    ctx.data_opt::<Viewer>().cloned().unwrap_or_default()
}

pub fn loaders<'a>(ctx: &Context<'a>) -> Result<&'a Loaders> {
    ctx.data::<Loaders>()
}
