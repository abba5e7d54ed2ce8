pub mod candidates;
pub mod zobrist;

pub use candidates::CandidateGenerator;
pub use zobrist::ZobristTable;
