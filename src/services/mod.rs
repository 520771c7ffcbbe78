pub mod library;
pub mod pipeline;
pub mod presentation;
pub mod providers;
pub mod recommendations;
pub mod resolver;
pub mod session;

pub use library::LibraryFetcher;
pub use pipeline::SubmissionPipeline;
pub use session::SessionStore;
