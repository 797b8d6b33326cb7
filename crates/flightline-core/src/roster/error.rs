use thiserror::Error;

use crate::promotion::PromotionError;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("No member with id {0}")]
    MemberNotFound(String),

    #[error("{id} still supervises {count} member(s); reassign them first")]
    HasSupervisees { id: String, count: usize },

    #[error("{0} cannot supervise themselves")]
    SelfSupervision(String),

    #[error("{supervisor} already reports up to {id}")]
    SupervisionCycle { id: String, supervisor: String },

    #[error("Field name cannot be empty")]
    EmptyFieldName,

    #[error(transparent)]
    Promotion(#[from] PromotionError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
