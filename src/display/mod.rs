mod decision;
pub(crate) mod error;
mod target;

pub use decision::{DisplayDecisionEngine, DisplayState, Reconciliation};
pub use target::{
    DEFAULT_BANNER_TEXT, DEFAULT_FONT_SIZE, DEFAULT_PAGE_URL, OverlayTarget, WebSourceConfig,
};
