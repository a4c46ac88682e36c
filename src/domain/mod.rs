pub mod media;
pub mod post;
pub mod social_graph;
pub mod tag;
pub mod user;
