use thiserror::Error;

use crate::state::TabState;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("No open tab with id {0}")]
    NotFound(String),

    #[error("Tab cannot go from {from} to {to}")]
    InvalidTransition { from: TabState, to: TabState },

    #[error("A tab needs a URL to show")]
    EmptyUrl,
}
