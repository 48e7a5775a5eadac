pub mod addresser;
pub mod finder;
pub mod pipeline;
pub mod scanner;
pub mod substituter;
pub mod uploader;

pub use addresser::ContentAddresser;
pub use finder::{Discovery, DocumentFinder};
pub use pipeline::{scan_tree, NotebookPipeline};
pub use scanner::PayloadScanner;
pub use substituter::Substituter;
pub use uploader::{GitHubUploader, ImageUploader};
