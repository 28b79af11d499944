use crate::catalog::PaginationMetadata;

/// Offsets of the listing pages still to fetch after the first one.
///
/// `pages = min(ceil(total / limit), floor(max_offset / limit))`, emitted as
/// `limit, 2 * limit, ..., pages * limit`. A zero `limit` or a catalog that
/// fits on the first page yields nothing.
pub fn plan_offsets(limit: u32, total: u32, max_offset: u32) -> Vec<u32> {
    if limit == 0 || total <= limit {
        return Vec::new();
    }

    let possible_pages = total.div_ceil(limit);
    let max_pages = max_offset / limit;
    let pages = possible_pages.min(max_pages);

    (1..=pages).map(|page| page * limit).collect()
}

pub fn plan(pagination: &PaginationMetadata, max_offset: u32) -> Vec<u32> {
    plan_offsets(pagination.limit, pagination.total, max_offset)
}
