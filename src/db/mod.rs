pub mod store;

pub use store::Store;

/// Table names shared by the writer and the dashboard's read queries.
pub mod tables {
    pub const CATEGORIES: &str = "Categories";
    pub const COMPETITIONS: &str = "Competitions";
    pub const COMPLEXES: &str = "Complexes";
    pub const VENUES: &str = "Venues";
    pub const COMPETITORS: &str = "Competitors";
    pub const COMPETITOR_RANKINGS: &str = "Competitor_Rankings";
}
