pub mod api;
pub mod auth;
pub mod listing;


pub use api::{RedditApiClient, RedditEndpoints, RedditListing, MAX_PAGE_SIZE};
pub use auth::{fetch_app_token, AppOnlyToken, RedditAuthConfig};
pub use listing::ListingSource;
