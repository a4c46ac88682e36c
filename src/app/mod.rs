pub mod auth;
pub mod engagement;
pub mod feed;
pub mod geo;
pub mod media;
pub mod normalize;
pub mod posts;
pub mod social;
pub mod store;
pub mod users;
pub mod view;
