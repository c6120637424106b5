mod movie;
mod promise;
pub mod utils;
mod view;

pub use crate::data::{
    movie::{
        CastMember, Genre, MovieDetail, MovieId, MovieImages, MovieOverlay, MovieSummary,
        StreamingProvider,
    },
    promise::Promise,
    view::{LoadStatus, LoadTicket, Snapshot, View},
};
