pub mod save;
pub mod status;

pub use save::{FileSaver, SaveError, SavedFile, Saver};
pub use status::{Status, StatusBoard, StatusKind, StatusPresentation, StatusReporter};
