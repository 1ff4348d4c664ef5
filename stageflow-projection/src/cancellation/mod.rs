//! Cooperative cancellation for submissions, demo playback and the
//! controller task.

mod token;

pub use token::CancellationToken;
