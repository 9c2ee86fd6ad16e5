/// Hard upper bound for any listing page size to protect DB and memory usage.
pub const MAX_PAGE_SIZE: i32 = 100;
/// How many entries the stats dashboard shows for the most-viewed list.
pub const TOP_VIEWED_LIMIT: i64 = 5;
/// How many calendar months the publish chart covers.
pub const PUBLISHED_MONTHS_WINDOW: u32 = 6;

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
pub const TOTAL_PAGES_HEADER: &str = "x-total-pages";
