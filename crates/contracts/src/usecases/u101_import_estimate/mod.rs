pub mod progress;
pub mod request;
pub mod response;

pub use progress::{ImportProgress, ImportStage, ImportStatus};
pub use request::ImportRequest;
pub use response::{ImportResponse, ImportStartStatus};
