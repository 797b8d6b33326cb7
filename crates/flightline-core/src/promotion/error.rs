use thiserror::Error;

use crate::models::Rank;

/// Why a rank transition was refused. The input member is never modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromotionError {
    #[error("Rank {0} is not on the enlisted promotion ladder")]
    InvalidRank(Rank),

    #[error("{0} is the highest rank on the ladder")]
    LadderExhausted(Rank),

    #[error("A {0} is required")]
    MissingDate(&'static str),

    #[error("Rank {0} is not promoted through a selection board")]
    NotBoardRank(Rank),
}
