use snafu::Snafu;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum SRSError {
    #[snafu(display("invalid review rating: {value:?}"))]
    InvalidRating { value: String },
    #[snafu(display("card violates scheduling invariants: {reason}"))]
    InvalidCardState { reason: String },
    #[snafu(display("card {id} not found"))]
    CardNotFound { id: i64 },
    #[snafu(display("card store failed: {source}"))]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    InvalidDeckSize,
    InvalidProbabilities,
}

impl PartialEq for SRSError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidRating { value: a }, Self::InvalidRating { value: b }) => a == b,
            (Self::InvalidCardState { reason: a }, Self::InvalidCardState { reason: b }) => a == b,
            (Self::CardNotFound { id: a }, Self::CardNotFound { id: b }) => a == b,
            // Backend errors are not comparable; only the variant is.
            (Self::Storage { .. }, Self::Storage { .. }) => true,
            (Self::InvalidDeckSize, Self::InvalidDeckSize) => true,
            (Self::InvalidProbabilities, Self::InvalidProbabilities) => true,
            _ => false,
        }
    }
}

pub type Result<T, E = SRSError> = std::result::Result<T, E>;
