// handlers/mod.rs - three security tiers
//
// Public (no auth) → Protected (JWT + user validation) → Elevated (master admin)

pub mod elevated; // /api/root/*
pub mod protected; // /api/*
pub mod public; // /, /health

use crate::error::ApiError;
use crate::filter::{FilterOrder, PageParams, Pagination, SortDirection, SortSpec};
use crate::state::AppState;

/// Resolve `page`, `limit` and `order` for a list endpoint
pub(crate) fn list_window(
    state: &AppState,
    params: &PageParams,
    columns: &[&'static str],
) -> Result<(Pagination, Vec<SortSpec>), ApiError> {
    let pagination = Pagination::resolve(params, &state.config.api)?;
    let sort = FilterOrder::parse(
        params.order.as_deref(),
        columns,
        SortSpec { column: "name", sort: SortDirection::Asc },
    )?;
    Ok((pagination, sort))
}
